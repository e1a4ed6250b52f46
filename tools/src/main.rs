// Batch driver over a directory of MATE Terminal profiles (`*.dconf`,
// searched recursively).
//
//   scheme-swatch-tools index  <schemes-dir> [out.json] [out-stats.md]
//   scheme-swatch-tools score  <schemes-dir> [out.json] [contrast|spread|bg]
//   scheme-swatch-tools verify <schemes-dir> <screens-dir> [options.json]
//   scheme-swatch-tools validate <schemes-dir>
//   scheme-swatch-tools pattern
//
// `verify` expects one screenshot `<screens-dir>/<profile id>.png` per
// profile, taken while the terminal shows the output of `pattern`.
// `validate` checks every file is in the form the generator writes.
// Symbolic links to directories are not followed.
// Logs go to stderr; set RUST_LOG to change the level.

use std::{env,
          error::Error,
          fs,
          path::{Path, PathBuf},
          process};
use scheme_swatch::{profile, score::score_corpus, verify::ansi_test_pattern,
                    CorpusIndex, Profile, ScoreKey, Screenshot, VerifyBatch,
                    VerifyOptions};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

const USAGE: &str = "usage: scheme-swatch-tools \
                     (index|score|verify|validate|pattern) <schemes-dir> [args…]";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// All `*.dconf` files below `dir`, sorted.
fn dconf_files(dir: &Path) -> walkdir::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|e| e == "dconf") {
            files.push(entry.into_path())
        }
    }
    files.sort();
    Ok(files)
}

/// Profiles below `dir`.  Files that do not describe a complete
/// scheme are skipped with a warning.
fn load_profiles(dir: &Path) -> Result<Vec<Profile>, Box<dyn Error>> {
    let files = dconf_files(dir)?;
    if files.is_empty() {
        return Err(format!("no .dconf files found under {}", dir.display()).into())
    }
    let mut profiles = Vec::with_capacity(files.len());
    for path in &files {
        let id = path.file_stem().map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = fs::read_to_string(path)?;
        match Profile::parse(&id, &text) {
            Ok(p) => profiles.push(p.with_path(path)),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping profile"),
        }
    }
    info!(files = files.len(), profiles = profiles.len(), "profiles loaded");
    Ok(profiles)
}

fn write_out(path: Option<&String>, content: &str) -> std::io::Result<()> {
    match path {
        Some(p) => {
            if let Some(dir) = Path::new(p).parent() { fs::create_dir_all(dir)? }
            fs::write(p, content)?;
            info!(path = %p, "written");
            Ok(())
        }
        None => { print!("{content}"); Ok(()) }
    }
}

fn score_key(s: &str) -> Result<ScoreKey, Box<dyn Error>> {
    match s {
        "contrast" => Ok(ScoreKey::Contrast),
        "spread" => Ok(ScoreKey::Spread),
        "bg" => Ok(ScoreKey::BackgroundSaturation),
        _ => Err(format!("unknown ranking {s:?}").into()),
    }
}

/// Verify every profile against its screenshot.  Returns whether all
/// passed.
fn verify(schemes: &Path, screens: &Path, opts: &VerifyOptions)
          -> Result<bool, Box<dyn Error>> {
    let profiles = load_profiles(schemes)?;
    let mut batch = VerifyBatch::new();
    // One screenshot in memory at a time.
    for p in &profiles {
        let png = screens.join(format!("{}.png", p.id));
        let outcome = fs::read(&png).map_err(scheme_swatch::Error::from)
            .and_then(|bytes| Screenshot::decode(&bytes))
            .and_then(|shot| scheme_swatch::verify(&shot, &p.scheme, opts));
        batch.record(p.id.as_str(), outcome);
    }
    println!("{}", batch.summary());
    Ok(batch.is_pass())
}

/// Check every profile file below `dir`, listing at most 6 issues per
/// file.  Returns whether all files are valid.
fn validate(dir: &Path) -> Result<bool, Box<dyn Error>> {
    let files = dconf_files(dir)?;
    if files.is_empty() {
        return Err(format!("no .dconf files found under {}", dir.display()).into())
    }
    let mut failed = 0;
    for path in &files {
        let issues = profile::validate(&fs::read_to_string(path)?);
        if issues.is_empty() { continue }
        failed += 1;
        eprintln!("{}:", path.display());
        for issue in issues.iter().take(6) { eprintln!("  - {issue}") }
    }
    if failed > 0 {
        eprintln!("validation failures: {failed}/{}", files.len());
        return Ok(false)
    }
    println!("ok: {} files validated in {}", files.len(), dir.display());
    Ok(true)
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(cmd) = args.first() else { return Err(USAGE.into()) };
    if cmd == "pattern" {
        print!("{}", ansi_test_pattern());
        return Ok(())
    }
    let dir = Path::new(args.get(1).ok_or(USAGE)?);
    match cmd.as_str() {
        "index" => {
            let index = CorpusIndex::build(&load_profiles(dir)?);
            write_out(args.get(2), &(index.to_json()? + "\n"))?;
            if args.get(3).is_some() {
                write_out(args.get(3), &index.to_markdown())?;
            }
        }
        "score" => {
            let mut report = score_corpus(&load_profiles(dir)?);
            if let Some(key) = args.get(3) { report.rank(score_key(key)?) }
            write_out(args.get(2), &(report.to_json()? + "\n"))?;
        }
        "verify" => {
            let screens = Path::new(args.get(2).ok_or(USAGE)?);
            let opts = match args.get(3) {
                Some(p) => VerifyOptions::from_json(&fs::read_to_string(p)?)?,
                None => VerifyOptions::default(),
            };
            if !verify(dir, screens, &opts)? { process::exit(1) }
        }
        "validate" => if !validate(dir)? { process::exit(1) },
        _ => return Err(USAGE.into()),
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn dconf_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("kty/b.dconf"), "");
        write(&dir.path().join("gogh/a.dconf"), "");
        write(&dir.path().join("gogh/notes.txt"), "");
        write(&dir.path().join("top.dconf"), "");
        let files: Vec<_> = dconf_files(dir.path()).unwrap().into_iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf()).collect();
        assert_eq!(files, [Path::new("gogh/a.dconf"), Path::new("kty/b.dconf"),
                           Path::new("top.dconf")]);
    }

    #[cfg(unix)]
    #[test]
    fn linked_directories_are_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let mocha = dir.path().join("sub/gogh-mocha.dconf");
        let scheme = scheme_swatch::Scheme::parse(
            "#1e1e2e", "#cdd6f4", &["#89b4fa"; 16]).unwrap();
        write(&mocha, &profile::to_dconf("Mocha", &scheme));
        std::os::unix::fs::symlink("..", dir.path().join("sub/loop")).unwrap();
        assert_eq!(dconf_files(dir.path()).unwrap(), [mocha.clone()]);
        let profiles = load_profiles(dir.path()).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].path.as_deref(), Some(mocha.as_path()));
        let index = CorpusIndex::build(&profiles);
        assert_eq!(index.count, 1);
        assert!(index.duplicate_fingerprints.is_empty());
    }

    #[test]
    fn validate_reports_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let scheme = scheme_swatch::Scheme::parse(
            "#000000", "#ffffff", &["#808080"; 16]).unwrap();
        write(&dir.path().join("good.dconf"), &profile::to_dconf("Good", &scheme));
        assert!(validate(dir.path()).unwrap());
        write(&dir.path().join("bad.dconf"), "[/]\nvisible-name='Bad'\n");
        assert!(!validate(dir.path()).unwrap());
        let empty = tempfile::tempdir().unwrap();
        assert!(validate(empty.path()).is_err());
    }
}
