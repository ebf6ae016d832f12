//! Client Facade
//!
//! Sequences the two protocol phases for each public verb: resolve a
//! storage server via the tracker, then perform the transfer against it.
//! Storage pools are built on demand through the process-wide registry,
//! keyed by `ip:port`.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{FdfsError, Result};
use crate::pool::{ConnectionPool, PoolRegistry};
use crate::protocol::{StorageServer, UploadFileResponse};
use crate::storage::{
    DownloadFileResponse, DownloadSink, StorageClient, UploadKind, UploadSource, UploadStream,
};
use crate::tracker::TrackerClient;

/// High-level FastDFS client
pub struct FdfsClient {
    config: Config,
    tracker_pool: Arc<ConnectionPool>,
}

impl FdfsClient {
    /// Create a client, pre-warming the tracker pool per the config
    pub fn new(config: Config) -> Result<Self> {
        let tracker_pool = ConnectionPool::with_timeout(
            config.tracker_hosts.clone(),
            config.tracker_port,
            config.min_conns,
            config.max_conns,
            config.connect_timeout,
        )?;
        Ok(Self {
            config,
            tracker_pool,
        })
    }

    /// Create a client from a configuration file
    pub fn from_conf_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(Config::from_file(path)?)
    }

    // -------------------------------------------------------------------------
    // Upload
    // -------------------------------------------------------------------------

    /// Upload a local file; the extension is taken from the filename
    pub fn upload_by_filename(&self, filename: impl AsRef<Path>) -> Result<UploadFileResponse> {
        let filename = filename.as_ref();
        self.upload_new(UploadSource::Path(filename.to_path_buf()), &file_ext(filename))
    }

    /// Upload an in-memory buffer
    pub fn upload_by_buffer(&self, buffer: Vec<u8>, file_ext: &str) -> Result<UploadFileResponse> {
        self.upload_new(UploadSource::Buffer(buffer), file_ext)
    }

    /// Upload from a seekable stream, sent in fixed-size chunks
    pub fn upload_by_stream(
        &self,
        stream: Box<dyn UploadStream>,
        file_ext: &str,
    ) -> Result<UploadFileResponse> {
        self.upload_new(UploadSource::Stream(stream), file_ext)
    }

    fn upload_new(&self, source: UploadSource, file_ext: &str) -> Result<UploadFileResponse> {
        let server = self.tracker().query_store_without_group()?;
        self.storage(&server)?
            .upload(&server, source, UploadKind::New, file_ext)
    }

    // -------------------------------------------------------------------------
    // Upload (appender)
    // -------------------------------------------------------------------------

    /// Upload a local file as an appender file
    pub fn upload_appender_by_filename(
        &self,
        filename: impl AsRef<Path>,
    ) -> Result<UploadFileResponse> {
        let filename = filename.as_ref();
        self.upload_appender(
            UploadSource::Path(filename.to_path_buf()),
            &file_ext(filename),
        )
    }

    /// Upload a buffer as an appender file
    pub fn upload_appender_by_buffer(
        &self,
        buffer: Vec<u8>,
        file_ext: &str,
    ) -> Result<UploadFileResponse> {
        self.upload_appender(UploadSource::Buffer(buffer), file_ext)
    }

    /// Upload a seekable stream as an appender file
    pub fn upload_appender_by_stream(
        &self,
        stream: Box<dyn UploadStream>,
        file_ext: &str,
    ) -> Result<UploadFileResponse> {
        self.upload_appender(UploadSource::Stream(stream), file_ext)
    }

    fn upload_appender(&self, source: UploadSource, file_ext: &str) -> Result<UploadFileResponse> {
        let server = self.tracker().query_store_without_group()?;
        self.storage(&server)?
            .upload(&server, source, UploadKind::Appender, file_ext)
    }

    // -------------------------------------------------------------------------
    // Upload (slave)
    // -------------------------------------------------------------------------

    /// Upload a local file as a slave of an existing master upload
    pub fn upload_slave_by_filename(
        &self,
        filename: impl AsRef<Path>,
        master_file_id: &str,
        prefix: &str,
    ) -> Result<UploadFileResponse> {
        let filename = filename.as_ref();
        self.upload_slave(
            UploadSource::Path(filename.to_path_buf()),
            master_file_id,
            prefix,
            &file_ext(filename),
        )
    }

    /// Upload a buffer as a slave of an existing master upload
    pub fn upload_slave_by_buffer(
        &self,
        buffer: Vec<u8>,
        master_file_id: &str,
        prefix: &str,
        file_ext: &str,
    ) -> Result<UploadFileResponse> {
        self.upload_slave(UploadSource::Buffer(buffer), master_file_id, prefix, file_ext)
    }

    /// Upload a seekable stream as a slave of an existing master upload
    pub fn upload_slave_by_stream(
        &self,
        stream: Box<dyn UploadStream>,
        master_file_id: &str,
        prefix: &str,
        file_ext: &str,
    ) -> Result<UploadFileResponse> {
        self.upload_slave(UploadSource::Stream(stream), master_file_id, prefix, file_ext)
    }

    fn upload_slave(
        &self,
        source: UploadSource,
        master_file_id: &str,
        prefix: &str,
        file_ext: &str,
    ) -> Result<UploadFileResponse> {
        let (group_name, master_filename) = split_remote_file_id(master_file_id)?;
        let server = self.tracker().query_store_with_group(group_name)?;
        self.storage(&server)?.upload(
            &server,
            source,
            UploadKind::Slave {
                master_filename: master_filename.to_string(),
                prefix: prefix.to_string(),
            },
            file_ext,
        )
    }

    // -------------------------------------------------------------------------
    // Delete / Download
    // -------------------------------------------------------------------------

    /// Delete a remote file by its `<group>/<name>` identifier
    pub fn delete_file(&self, remote_file_id: &str) -> Result<()> {
        let (group_name, remote_filename) = split_remote_file_id(remote_file_id)?;
        let server = self.tracker().query_update(group_name, remote_filename)?;
        self.storage(&server)?
            .delete(&server.group_name, remote_filename)
    }

    /// Download a remote file into a newly created local file
    pub fn download_to_file(
        &self,
        local_filename: impl AsRef<Path>,
        remote_file_id: &str,
        offset: u64,
        download_size: u64,
    ) -> Result<DownloadFileResponse> {
        self.download(
            DownloadSink::Path(local_filename.as_ref().to_path_buf()),
            remote_file_id,
            offset,
            download_size,
        )
    }

    /// Download a remote file into memory
    pub fn download_to_buffer(
        &self,
        remote_file_id: &str,
        offset: u64,
        download_size: u64,
    ) -> Result<DownloadFileResponse> {
        self.download(DownloadSink::Buffer, remote_file_id, offset, download_size)
    }

    fn download(
        &self,
        sink: DownloadSink,
        remote_file_id: &str,
        offset: u64,
        download_size: u64,
    ) -> Result<DownloadFileResponse> {
        let (group_name, remote_filename) = split_remote_file_id(remote_file_id)?;
        let server = self.tracker().query_fetch(group_name, remote_filename)?;
        self.storage(&server)?.download(
            sink,
            &server.group_name,
            remote_filename,
            offset,
            download_size,
        )
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Close the tracker pool and every registered storage pool
    pub fn shutdown(&self) {
        self.tracker_pool.shutdown();
        PoolRegistry::global().shutdown_all();
    }

    fn tracker(&self) -> TrackerClient {
        TrackerClient::new(Arc::clone(&self.tracker_pool))
    }

    /// Storage client for a resolved server, pooled through the registry
    fn storage(&self, server: &StorageServer) -> Result<StorageClient> {
        let key = format!("{}:{}", server.ip_addr, server.port);
        let pool = PoolRegistry::global().get_or_create(
            &key,
            vec![server.ip_addr.clone()],
            server.port,
            self.config.min_conns,
            self.config.max_conns,
            self.config.connect_timeout,
        )?;
        Ok(StorageClient::new(pool))
    }
}

/// Split a `<group>/<name>` identifier at its first separator
pub fn split_remote_file_id(remote_file_id: &str) -> Result<(&str, &str)> {
    remote_file_id
        .split_once('/')
        .filter(|(group, name)| !group.is_empty() && !name.is_empty())
        .ok_or_else(|| FdfsError::InvalidFileId(remote_file_id.to_string()))
}

/// Extension of a filename, empty when it has none
fn file_ext(filename: &Path) -> String {
    filename
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default()
}
