use std::fs;
use std::path::{Path, PathBuf};

use clap::CommandFactory;

// cli.rs only needs clap, clap_complete and chrono, all build-dependencies.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir: PathBuf = std::env::var_os("OUT_DIR")
        .expect("OUT_DIR not set by Cargo")
        .into();
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("failed to create man output directory");

    // innkeep.1, innkeep-report.1, innkeep-report-month.1, ...
    let mut pending = vec![(String::new(), cli::Cli::command())];
    while let Some((prefix, cmd)) = pending.pop() {
        let name = if prefix.is_empty() {
            cmd.get_name().to_owned()
        } else {
            format!("{prefix}-{}", cmd.get_name())
        };
        write_manpage(&cmd.clone().name(name.clone()), &man_dir.join(format!("{name}.1")));

        for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
            pending.push((name.clone(), sub.clone()));
        }
    }
}

fn write_manpage(cmd: &clap::Command, path: &Path) {
    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd.clone())
        .render(&mut buf)
        .unwrap_or_else(|e| panic!("failed to render {}: {e}", path.display()));
    fs::write(path, buf).unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
}
