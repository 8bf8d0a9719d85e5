use std::path::{Path, PathBuf};

use shotlist_media::{check_ffmpeg, check_ffprobe, check_tesseract, probe_video, MediaResult};
use shotlist_worker::ShotlistConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ShotlistConfig::from_env();

    println!(
        "shotlist-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;
    ensure_tool("ffmpeg", check_ffmpeg)?;
    ensure_tool("ffprobe", check_ffprobe)?;
    ensure_tool("tesseract", check_tesseract)?;

    // Optional sample video, probed end to end
    if let Some(sample) = std::env::var_os("SHOTLIST_SELFCHECK_SAMPLE") {
        ensure_sample(Path::new(&sample)).await?;
    }

    println!("shotlist-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    let probe = tempfile::tempfile_in(path)
        .map_err(|e| anyhow::anyhow!("work dir {} not writable: {}", path.display(), e))?;
    drop(probe);
    Ok(())
}

fn ensure_tool(name: &str, check: fn() -> MediaResult<PathBuf>) -> anyhow::Result<()> {
    let path = check().map_err(|e| anyhow::anyhow!("{} not available: {}", name, e))?;
    println!("shotlist-selfcheck: {} at {}", name, path.display());
    Ok(())
}

async fn ensure_sample(path: &Path) -> anyhow::Result<()> {
    let info = probe_video(path)
        .await
        .map_err(|e| anyhow::anyhow!("sample {} not probeable: {}", path.display(), e))?;
    if !info.duration.is_finite() || info.duration <= 0.0 {
        anyhow::bail!("sample {} has no usable duration", path.display());
    }
    println!(
        "shotlist-selfcheck: sample {} duration={:.2}s {}x{} fps={:.2} codec={}",
        path.display(),
        info.duration,
        info.width,
        info.height,
        info.fps,
        info.codec
    );
    Ok(())
}
