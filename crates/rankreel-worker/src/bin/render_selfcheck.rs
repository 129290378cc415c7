use std::path::Path;
use std::process::Command;

use rankreel_worker::RenderConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = RenderConfig::from_env();

    println!(
        "render-selfcheck: starting with scratch_dir={}",
        config.scratch_dir.display()
    );
    config.validate()?;
    ensure_scratch_writable(&config.scratch_dir).await?;
    ensure_tool("ffmpeg")?;
    ensure_tool("ffprobe")?;
    report_font(config.font_file.as_deref());

    println!("render-selfcheck: ok");
    Ok(())
}

async fn ensure_scratch_writable(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path).await?;
    let probe = path.join(".selfcheck");
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("scratch dir {} not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

fn ensure_tool(name: &str) -> anyhow::Result<()> {
    let output = Command::new(name)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("{} not available: {}", name, e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("{} -version failed: {:?}", name, output.status));
    }
    Ok(())
}

fn report_font(font: Option<&Path>) {
    match font {
        Some(path) if path.is_file() => println!("render-selfcheck: font {}", path.display()),
        Some(path) => println!(
            "render-selfcheck: font {} missing, falling back to fontconfig",
            path.display()
        ),
        None => println!("render-selfcheck: using fontconfig font"),
    }
}
