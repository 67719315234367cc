use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest with default configuration
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Write a sample playable-ad project tree for manual testing
    Fixture {
        /// Target directory; created if missing
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::Fixture { out } => write_fixture(&out)?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo nextest run failed");
    }
    Ok(())
}

fn write_fixture(out: &Path) -> Result<()> {
    write(out, "public/assets/ui/button.png", b"fixture png bytes")?;
    write(out, "public/assets/ui/logo.png", b"fixture png bytes")?;
    write(out, "public/assets/audio/theme.mp3", b"fixture mp3 bytes")?;
    write(
        out,
        "media/ui_button.png.js",
        b"export const buttonPNG = \"data:image/png;base64,Zml4dHVyZQ==\";",
    )?;
    write(
        out,
        "src/scenes/preloader.js",
        concat!(
            "import { buttonPNG } from \"../../media/ui_button.png.js\";\n",
            "import { themeMP3 } from \"../../media/audio_theme.mp3.js\";\n",
            "import { LoadBase64Audio } from \"./LoadBase64Audio\";\n",
            "\n",
            "export class Preloader {\n",
            "  preload() {\n",
            "    this.load.image(\"btn\", buttonPNG);\n",
            "    LoadBase64Audio(this, [\n",
            "      { key: \"theme\", data: themeMP3 },\n",
            "    ]);\n",
            "  }\n",
            "}\n"
        )
        .as_bytes(),
    )?;
    write(
        out,
        "src/config.js",
        concat!(
            "// Generated sample configuration.\n",
            "export const config = {\n",
            "  adNetworkType: \"meta\",\n",
            "  googlePlayStoreLink: \"https://play.example/app\",\n",
            "  appleStoreLink: \"https://apps.example/app\",\n",
            "};\n"
        )
        .as_bytes(),
    )?;
    println!("fixture project written to {}", out.display());
    Ok(())
}

fn write(root: &Path, relative: &str, contents: &[u8]) -> Result<()> {
    let path = root.join(relative);
    let parent = path.parent().context("fixture path has no parent")?;
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
}
