//! Renders the `gateway-telemetry(1)` manual page from the CLI definition.

use std::{fs, path::Path};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
mod cli;

const MAN_DIR: &str = "target/generated-man";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let cmd = cli::Cli::command();
    let page = Path::new(MAN_DIR).join(format!("{}.1", cmd.get_name()));
    let man = Man::new(cmd)
        .section("1")
        .manual("Gateway Telemetry Manual")
        .source(concat!("gateway-telemetry ", env!("CARGO_PKG_VERSION")));

    let mut rendered = Vec::new();
    man.render(&mut rendered)?;
    fs::create_dir_all(MAN_DIR)?;
    fs::write(page, rendered)?;

    Ok(())
}
