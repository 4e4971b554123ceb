use crate::error::FetchError;
use crate::http::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, error, info, trace};

/// Size of each block written to disk while streaming a download.
pub const CHUNK_SIZE: usize = 8 * 1024; // 8 KB

/// Outcome of a completed [`download_file`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Download {
    pub http_status: u16,

    /// Size of the written file, as read back from disk.
    pub bytes: u64,
}

/// GET request a file from `url` and stream it to `path`, writing in blocks
/// of [`CHUNK_SIZE`] so the body is never held in memory whole.
///
/// A 4xx/5xx response fails before `path` is created.
pub async fn download_file(
    http_client: &HttpClient,
    url: &str,
    path: &Path,
    tui: bool,
) -> Result<Download, FetchError> {
    let mut response = http_client.get(url).send().await.map_err(|err| {
        error!("request to {url} failed: {err}");
        err
    })?;

    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        error!("{url} responded with {status}");
        return Err(FetchError::Rejected {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let file_size = response.content_length().unwrap_or(0);
    trace!("{url} responded with {status}, content length {file_size}");

    // ensure the directory exists
    if let Some(dir_path) = path.parent() {
        trace!("checking directory path: {:?}", dir_path);
        tokio::fs::create_dir_all(dir_path).await?;
    }

    // progress bar
    let pb = if tui {
        let pb = ProgressBar::new(file_size).with_style(
            ProgressStyle::default_bar()
                .template(
                    "{msg} {spinner:.magenta}\n\
                    [{elapsed_precise:.magenta}] |{bar:40.cyan/blue}| {bytes}/{total_bytes} \
                    [Rate: {bytes_per_sec:.magenta}, ETA: {eta:.blue}]",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    } else {
        ProgressBar::hidden()
    };
    pb.set_message(format!("downloading {url} ..."));

    let file = File::create(path).await?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    while let Some(chunk) = response.chunk().await? {
        writer.write_all(&chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    writer.flush().await?;
    pb.finish_and_clear();

    let bytes = tokio::fs::metadata(path).await?.len();
    debug!("{url} written to {path:?}, {bytes} bytes");

    Ok(Download {
        http_status: status.as_u16(),
        bytes,
    })
}

/// Unzip a `.zip` file (`zip_file`) into `to_dir`, creating directories as
/// necessary.
///
/// Returns the top-level names of the archive's members in archive order.
/// Members whose paths would escape `to_dir` are skipped.
pub fn unzip(zip_file: &Path, to_dir: &Path, tui: bool) -> Result<Vec<String>, FetchError> {
    debug!("unzipping {zip_file:?} to {to_dir:?}");

    let file = std::fs::File::open(zip_file)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|err| {
        error!("failed to open zip file at {:?}, {}", zip_file, err);
        err
    })?;

    // progress bar
    let pb = if tui {
        let pb = ProgressBar::new(archive.len() as u64).with_style(
            ProgressStyle::default_bar()
                .template(
                    "{msg} {spinner:.magenta}\n\
                    [{elapsed_precise:.magenta}] |{bar:40.cyan/blue}| {human_pos}/{human_len} files",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        pb.set_message("unzipping file ...");
        pb
    } else {
        ProgressBar::hidden()
    };

    std::fs::create_dir_all(to_dir)?;

    let mut members: Vec<String> = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(relative) = file.enclosed_name() else {
            error!("skipping unsafe zip member path {:?}", file.name());
            continue;
        };
        let outpath = to_dir.join(&relative);

        if let Some(top) = relative.components().next() {
            let top = top.as_os_str().to_string_lossy().into_owned();
            if !members.contains(&top) {
                members.push(top);
            }
        }

        if file.is_dir() {
            std::fs::create_dir_all(&outpath)?;
        } else {
            // if output directory does not exist, create it
            if let Some(outdir) = outpath.parent() {
                std::fs::create_dir_all(outdir)?;
            }

            // extract the file
            let mut outfile = std::fs::File::create(&outpath)?;
            trace!("copying {} to {:?}", file.name(), outpath);
            std::io::copy(&mut file, &mut outfile)?;
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("{zip_file:?} unzipped to {to_dir:?}");

    Ok(members)
}

/// Names of the entries directly inside `dir`, sorted.
pub fn list_dir(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<Vec<String>>>()?;
    names.sort();
    Ok(names)
}
