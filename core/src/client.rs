//! The request facade.
//!
//! # Design
//! `Courier` owns one `Transport` and is otherwise stateless. Each operation
//! validates its arguments, builds an `HttpRequest` with the functions in
//! `request`, executes it once, and interprets the response. Callers build a
//! single `Courier` and share it by reference; there is no global instance.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{require, RequestError, RequestResult};
use crate::http::{HttpMethod, HttpRequest, ResponseBody};
use crate::multipart::MultipartForm;
use crate::request::{self, FilePart, ImageSize};
use crate::transport::{Transport, UreqTransport};

/// Buffer size used when copying response bodies and files.
pub const BUFFER_SIZE: usize = 50 * 1024;

/// Consumer of a raw response body, such as an image decoder supplied by the
/// host platform.
pub trait BodyDecoder {
    type Output;

    fn decode(&self, body: &mut dyn Read) -> RequestResult<Self::Output>;
}

/// Synchronous HTTP facade. Every method blocks until the response has been
/// received (and, for downloads, written to disk).
#[derive(Debug)]
pub struct Courier<T = UreqTransport> {
    transport: T,
}

impl Courier<UreqTransport> {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(UreqTransport::new(config))
    }
}

impl Default for Courier<UreqTransport> {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl<T: Transport> Courier<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `url?query` and return the body as text.
    pub fn get(&self, url: &str, query: Option<&str>) -> RequestResult<String> {
        self.get_bytes(url, query)?.into_text()
    }

    /// GET `url?query` and return the unread body stream.
    pub fn get_bytes(&self, url: &str, query: Option<&str>) -> RequestResult<ResponseBody> {
        let request = request::build_get(url, query)?;
        self.execute(request)
    }

    /// GET `url?query` and hand the body to `decoder`.
    pub fn get_decoded<D: BodyDecoder>(&self, url: &str, query: Option<&str>, decoder: &D) -> RequestResult<D::Output> {
        let mut body = self.get_bytes(url, query)?;
        decoder.decode(&mut body)
    }

    pub fn post(&self, url: &str, json: &str) -> RequestResult<String> {
        self.send_json(HttpMethod::Post, url, json)
    }

    pub fn put(&self, url: &str, json: &str) -> RequestResult<String> {
        self.send_json(HttpMethod::Put, url, json)
    }

    pub fn delete(&self, url: &str, json: &str) -> RequestResult<String> {
        self.send_json(HttpMethod::Delete, url, json)
    }

    /// POST a `multipart/form-data` form built from parallel name/value
    /// slices. All files share `media_type`.
    pub fn post_multipart<P: AsRef<Path>>(
        &self,
        url: &str,
        text_names: &[&str],
        text_values: &[&str],
        file_names: &[&str],
        files: &[P],
        media_type: &str,
    ) -> RequestResult<String> {
        request::validate_multipart(
            url,
            text_names.len(),
            text_values.len(),
            file_names.len(),
            files.len(),
            media_type,
        )?;
        let parts = files
            .iter()
            .map(|p| FilePart::read(p.as_ref()))
            .collect::<RequestResult<Vec<_>>>()?;
        let request = request::build_multipart(
            url,
            text_names,
            text_values,
            file_names,
            &parts,
            media_type,
            MultipartForm::new(),
        )?;
        self.execute(request)?.into_text()
    }

    /// POST the raw contents of `file_path` to the TFS store at `base_url`.
    pub fn upload_file(&self, base_url: &str, file_path: impl AsRef<Path>) -> RequestResult<String> {
        require(base_url, "upload address")?;
        let contents = read_file(file_path.as_ref())?;
        self.execute(request::build_upload(base_url, contents)?)?.into_text()
    }

    /// POST the raw contents of an image file directly to `server_url`.
    pub fn submit_image(&self, server_url: &str, file_path: impl AsRef<Path>) -> RequestResult<String> {
        require(server_url, "image server address")?;
        let path = file_path.as_ref();
        let contents = read_file(path)?;
        self.execute(request::build_image_submit(server_url, path, contents)?)?
            .into_text()
    }

    /// Download `file_name` scaled to `width` (and `height`, when given) into
    /// `local_dir`. Returns the path of the written file.
    pub fn download_image(
        &self,
        local_dir: impl AsRef<Path>,
        file_name: &str,
        server_url: &str,
        width: u32,
        height: Option<u32>,
    ) -> RequestResult<PathBuf> {
        let size = match height {
            Some(h) => ImageSize::WidthHeight(width, h),
            None => ImageSize::Width(width),
        };
        self.download(local_dir.as_ref(), file_name, server_url, size)
    }

    /// Download `file_name` at its original size into `local_dir`.
    pub fn download_original_image(
        &self,
        local_dir: impl AsRef<Path>,
        file_name: &str,
        server_url: &str,
    ) -> RequestResult<PathBuf> {
        self.download(local_dir.as_ref(), file_name, server_url, ImageSize::Original)
    }

    fn download(&self, local_dir: &Path, file_name: &str, server_url: &str, size: ImageSize) -> RequestResult<PathBuf> {
        let destination = request::image_destination(local_dir, file_name)?;
        let request = request::build_image_request(server_url, file_name, size)?;

        if destination.exists() {
            return Err(RequestError::AlreadyExists(destination));
        }

        let body = self.execute(request)?;
        let file = create_new_file(&destination)?;
        if let Err(e) = copy_stream(body, file) {
            warn!("removing partial download {}", destination.display());
            let _ = fs::remove_file(&destination);
            return Err(e);
        }
        info!("saved image {}", destination.display());
        Ok(destination)
    }

    fn send_json(&self, method: HttpMethod, url: &str, json: &str) -> RequestResult<String> {
        let request = request::build_json(method, url, json)?;
        self.execute(request)?.into_text()
    }

    fn execute(&self, request: HttpRequest) -> RequestResult<ResponseBody> {
        let method = request.method;
        let url = request.url.clone();
        let response = self.transport.execute(request)?;
        if response.status != 200 {
            warn!("{method} {url} returned {}", response.status);
        } else if let Some(content_type) = response.header("content-type") {
            debug!("{method} {url} returned {content_type}");
        }
        request::parse_body(response)
    }
}

/// Copy all of `input` into `output` through a `BUFFER_SIZE` buffer, flush,
/// and release both. Returns the number of bytes copied.
pub fn copy_stream<R: Read, W: Write>(input: R, mut output: W) -> RequestResult<u64> {
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, input);
    let copied = io::copy(&mut reader, &mut output).map_err(|e| RequestError::transport("copying stream", e))?;
    output
        .flush()
        .map_err(|e| RequestError::transport("flushing stream", e))?;
    debug!("copied {copied} bytes");
    Ok(copied)
}

fn read_file(path: &Path) -> RequestResult<Vec<u8>> {
    if path.as_os_str().is_empty() {
        return Err(RequestError::Validation("file path must not be empty".to_string()));
    }
    fs::read(path).map_err(|e| RequestError::transport(format!("reading {}", path.display()), e))
}

/// Create `path` and any missing parent directories, refusing to replace an
/// existing file.
fn create_new_file(path: &Path) -> RequestResult<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| RequestError::transport(format!("creating directory {}", parent.display()), e))?;
    }
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => RequestError::AlreadyExists(path.to_path_buf()),
            _ => RequestError::transport(format!("creating {}", path.display()), e),
        })
}
