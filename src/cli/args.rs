//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Pack the stylesheets of a built site into per-page bundles
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Built site directory to process
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub site: PathBuf,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Output directory (default: rewrite the site in place)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Filesystem root searched first for local stylesheets
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Config file path (default: csspack.toml)
    #[arg(short = 'C', long, default_value = "csspack.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Re-inject bundles as inline <style> blocks
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub inline: Option<bool>,

    /// Prefix of generated stylesheet URLs (e.g. `/blog/`)
    #[arg(long)]
    pub site_root: Option<String>,

    /// Directory for packed stylesheets, relative to the site root
    #[arg(long)]
    pub output_path: Option<String>,

    /// Media used when a declaration has none
    #[arg(long)]
    pub default_media: Option<String>,

    /// Drop local stylesheets from the output once packed
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub remove_local_src: Option<bool>,

    /// Minify the packed CSS
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Print every scan, fetch and bundle step
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    /// Directory the packed site is written to.
    pub fn output_dir(&self) -> &PathBuf {
        self.output.as_ref().unwrap_or(&self.site)
    }

    /// Whether the run rewrites the site directory itself.
    pub fn in_place(&self) -> bool {
        self.output.as_ref().is_none_or(|out| *out == self.site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["csspack", "public"]).unwrap();
        assert_eq!(cli.site, PathBuf::from("public"));
        assert_eq!(cli.config, PathBuf::from("csspack.toml"));
        assert_eq!(cli.inline, None);
        assert_eq!(cli.minify, None);
        assert!(!cli.verbose);
        assert!(cli.in_place());
        assert_eq!(cli.output_dir(), &PathBuf::from("public"));
    }

    #[test]
    fn test_parse_overrides() {
        let cli = Cli::try_parse_from([
            "csspack",
            "public",
            "-o",
            "dist",
            "--inline",
            "--minify",
            "false",
            "--site-root",
            "/blog/",
            "-V",
        ])
        .unwrap();
        assert_eq!(cli.inline, Some(true));
        assert_eq!(cli.minify, Some(false));
        assert_eq!(cli.site_root.as_deref(), Some("/blog/"));
        assert!(cli.verbose);
        assert!(!cli.in_place());
        assert_eq!(cli.output_dir(), &PathBuf::from("dist"));
    }

    #[test]
    fn test_site_required() {
        assert!(Cli::try_parse_from(["csspack"]).is_err());
    }
}
