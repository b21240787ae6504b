//! `multipart/form-data` encoding.
//!
//! Parts are stored as readers with a declared length and only read when the
//! form is encoded, either into memory with [`MultipartFormData::encode`] or
//! streamed in fixed-size chunks with [`MultipartFormData::write_to`]. A part
//! whose reader yields a different number of bytes than declared fails the
//! whole encoding with [`MultipartError::InputStreamLength`].

use std::{
    fmt,
    fs::{self, File, OpenOptions},
    io::{self, Cursor, Read, Write},
    path::{Path, PathBuf},
};

use bytes::Bytes;
use url::Url;
use uuid::Uuid;

use crate::{HttpHeader, HttpHeaders, error::MultipartError};

/// Chunk size used when streaming part bodies.
pub const DEFAULT_STREAM_BUFFER_SIZE: usize = 1024;

const CRLF: &str = "\r\n";
const BOUNDARY_PREFIX: &str = "---------------------------";

type Result<T, E = MultipartError> = core::result::Result<T, E>;

/// Position of a boundary line in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryType {
    /// `--boundary\r\n`
    Initial,
    /// `\r\n--boundary\r\n`
    Interstitial,
    /// `\r\n--boundary--\r\n`
    Final,
}

impl BoundaryType {
    /// Render the delimiter for `boundary`.
    pub fn render(self, boundary: &str) -> String {
        match self {
            Self::Initial => format!("--{boundary}{CRLF}"),
            Self::Interstitial => format!("{CRLF}--{boundary}{CRLF}"),
            Self::Final => format!("{CRLF}--{boundary}--{CRLF}"),
        }
    }
}

/// One part of a multipart form.
pub struct MultipartFormBodyPart {
    headers: HttpHeaders,
    body: Box<dyn Read + Send>,
    content_length: u64,
}

impl MultipartFormBodyPart {
    /// Create a part from headers, a body reader and the reader's exact length.
    pub fn new(headers: HttpHeaders, body: impl Read + Send + 'static, content_length: u64) -> Self {
        Self {
            headers,
            body: Box::new(body),
            content_length,
        }
    }

    /// Part headers.
    pub const fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Declared body length.
    pub const fn content_length(&self) -> u64 {
        self.content_length
    }

    /// `Name: Value\r\n` lines followed by a blank line.
    pub fn encoded_headers(&self) -> Vec<u8> {
        let mut text: String = self
            .headers
            .iter()
            .map(|header| format!("{}: {}{CRLF}", header.name(), header.value()))
            .collect();
        text.push_str(CRLF);
        text.into_bytes()
    }

    fn encoded_len(&self) -> u64 {
        self.encoded_headers().len() as u64 + self.content_length
    }

    fn write_to<W: Write>(&mut self, out: &mut W, buffer_size: usize) -> Result<()> {
        write_all(out, &self.encoded_headers())?;

        let mut buffer = vec![0u8; buffer_size.max(1)];
        let mut written: u64 = 0;
        loop {
            let read = match self.body.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(MultipartError::InputStreamReadFailed(err)),
            };
            write_all(out, &buffer[..read])?;
            written += read as u64;
        }
        tracing::trace!(bytes = written, declared = self.content_length, "wrote multipart part");

        if written == self.content_length {
            Ok(())
        } else {
            Err(MultipartError::InputStreamLength {
                expected: self.content_length,
                actual: written,
            })
        }
    }
}

impl fmt::Debug for MultipartFormBodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartFormBodyPart")
            .field("headers", &self.headers)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

fn write_all<W: Write>(out: &mut W, data: &[u8]) -> Result<()> {
    out.write_all(data)
        .map_err(MultipartError::OutputStreamWriteFailed)
}

/// Builder for `multipart/form-data` payloads.
#[derive(Debug)]
pub struct MultipartFormData {
    boundary: String,
    body_parts: Vec<MultipartFormBodyPart>,
    buffer_size: usize,
}

impl Default for MultipartFormData {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartFormData {
    /// Create an empty form with a random boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(format!("{BOUNDARY_PREFIX}{}", Uuid::new_v4().simple()))
    }

    /// Create an empty form with a fixed boundary.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body_parts: Vec::new(),
            buffer_size: DEFAULT_STREAM_BUFFER_SIZE,
        }
    }

    /// Override the chunk size used when streaming part bodies.
    #[must_use]
    pub const fn stream_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Boundary string.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Appended parts, in order.
    pub fn body_parts(&self) -> &[MultipartFormBodyPart] {
        &self.body_parts
    }

    /// `Content-Type` value for this form.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Exact encoded size in bytes, computed from declared part lengths.
    pub fn content_length(&self) -> u64 {
        let delimiters = BoundaryType::Initial.render(&self.boundary).len()
            + BoundaryType::Final.render(&self.boundary).len()
            + BoundaryType::Interstitial.render(&self.boundary).len()
                * self.body_parts.len().saturating_sub(1);
        delimiters as u64
            + self
                .body_parts
                .iter()
                .map(MultipartFormBodyPart::encoded_len)
                .sum::<u64>()
    }

    /// Append a part with explicit headers.
    pub fn append_stream(
        &mut self,
        stream: impl Read + Send + 'static,
        length: u64,
        headers: HttpHeaders,
    ) {
        self.body_parts
            .push(MultipartFormBodyPart::new(headers, stream, length));
    }

    /// Append a file-like stream with a form field name, file name and MIME type.
    pub fn append_stream_with_name(
        &mut self,
        stream: impl Read + Send + 'static,
        length: u64,
        name: &str,
        file_name: &str,
        mime_type: &str,
    ) {
        let headers = content_headers(name, Some(file_name), Some(mime_type));
        self.append_stream(stream, length, headers);
    }

    /// Append in-memory data.
    pub fn append_data(
        &mut self,
        data: impl Into<Bytes>,
        name: &str,
        file_name: Option<&str>,
        mime_type: Option<&str>,
    ) {
        let data = data.into();
        let length = data.len() as u64;
        let headers = content_headers(name, file_name, mime_type);
        self.append_stream(Cursor::new(data), length, headers);
    }

    /// Append a file, taking its file name from the path and MIME type from the extension.
    ///
    /// # Errors
    ///
    /// [`MultipartError::InvalidFilename`] if the path lacks a file name or
    /// extension, plus everything [`Self::append_file_with_name`] reports.
    pub fn append_file(&mut self, path: impl AsRef<Path>, name: &str) -> Result<()> {
        let path = path.as_ref();
        let file_name = path.file_name().and_then(|name| name.to_str());
        let extension = path.extension().and_then(|ext| ext.to_str());
        match (file_name, extension) {
            (Some(file_name), Some(extension)) if !extension.is_empty() => {
                let mime_type = mime_type_for_extension(extension);
                self.append_file_with_name(path, name, file_name, &mime_type)
            }
            _ => Err(MultipartError::InvalidFilename(path.to_path_buf())),
        }
    }

    /// Append a `file:` URL.
    ///
    /// # Errors
    ///
    /// [`MultipartError::InvalidUrl`] for any other scheme, plus everything
    /// [`Self::append_file`] reports.
    pub fn append_file_url(&mut self, url: &Url, name: &str) -> Result<()> {
        if url.scheme() != "file" {
            return Err(MultipartError::InvalidUrl(url.clone()));
        }
        let path = url
            .to_file_path()
            .map_err(|()| MultipartError::InvalidUrl(url.clone()))?;
        self.append_file(path, name)
    }

    /// Append a file with explicit file name and MIME type.
    ///
    /// The file must exist, be accessible and not be a directory; its current
    /// size becomes the part's declared length.
    ///
    /// # Errors
    ///
    /// A distinct [`MultipartError`] for each failed check.
    pub fn append_file_with_name(
        &mut self,
        path: impl AsRef<Path>,
        name: &str,
        file_name: &str,
        mime_type: &str,
    ) -> Result<()> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|err| match err.kind() {
            io::ErrorKind::PermissionDenied => MultipartError::AccessDenied(path.to_path_buf()),
            _ => MultipartError::FileNotFound(path.to_path_buf(), err),
        })?;
        if metadata.is_dir() {
            return Err(MultipartError::FileIsDirectory(path.to_path_buf()));
        }
        if !metadata.is_file() {
            return Err(MultipartError::FileSizeNotAvailable(path.to_path_buf()));
        }
        let length = metadata.len();
        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::PermissionDenied => MultipartError::AccessDenied(path.to_path_buf()),
            _ => MultipartError::StreamCreation(path.to_path_buf(), err),
        })?;
        self.append_stream_with_name(file, length, name, file_name, mime_type);
        Ok(())
    }

    /// Encode every part into memory.
    ///
    /// # Errors
    ///
    /// Stream read failures and declared-length mismatches.
    pub fn encode(self) -> Result<Bytes> {
        let capacity = usize::try_from(self.content_length()).unwrap_or(0);
        let mut encoded = Vec::with_capacity(capacity);
        self.write_to(&mut encoded)?;
        Ok(Bytes::from(encoded))
    }

    /// Stream the encoded form into `out`.
    ///
    /// # Errors
    ///
    /// Stream read/write failures and declared-length mismatches.
    pub fn write_to<W: Write>(mut self, out: &mut W) -> Result<()> {
        let buffer_size = self.buffer_size;
        write_all(out, BoundaryType::Initial.render(&self.boundary).as_bytes())?;
        let interstitial = BoundaryType::Interstitial.render(&self.boundary);
        for (index, part) in self.body_parts.iter_mut().enumerate() {
            if index > 0 {
                write_all(out, interstitial.as_bytes())?;
            }
            part.write_to(out, buffer_size)?;
        }
        write_all(out, BoundaryType::Final.render(&self.boundary).as_bytes())?;
        out.flush().map_err(MultipartError::OutputStreamWriteFailed)
    }

    /// Stream the encoded form into a new file.
    ///
    /// # Errors
    ///
    /// [`MultipartError::FileAlreadyExists`] if `path` exists; otherwise as
    /// [`Self::write_to`].
    pub fn write_to_path(self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|err| match err.kind() {
                io::ErrorKind::AlreadyExists => {
                    MultipartError::FileAlreadyExists(path.to_path_buf())
                }
                io::ErrorKind::PermissionDenied => MultipartError::AccessDenied(path.to_path_buf()),
                _ => MultipartError::StreamCreation(path.to_path_buf(), err),
            })?;
        let mut writer = io::BufWriter::new(file);
        self.write_to(&mut writer)?;
        Ok(path.to_path_buf())
    }
}

fn content_headers(name: &str, file_name: Option<&str>, mime_type: Option<&str>) -> HttpHeaders {
    let mut disposition = format!("form-data; name=\"{name}\"");
    if let Some(file_name) = file_name {
        disposition.push_str(&format!("; filename=\"{file_name}\""));
    }
    let mut headers = HttpHeaders::new().add(HttpHeader::content_disposition(disposition));
    if let Some(mime_type) = mime_type {
        headers.update(HttpHeader::content_type(mime_type));
    }
    headers
}

/// MIME type for a file extension, `application/octet-stream` when unknown.
pub fn mime_type_for_extension(extension: &str) -> String {
    mime_guess::from_ext(extension)
        .first_or_octet_stream()
        .essence_str()
        .to_owned()
}
