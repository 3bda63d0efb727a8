use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{BigEndian, WriteBytesExt};
use log::{debug, trace};

use crate::error::{Error, Result};
use crate::field::{depths_to_bytes, write_field};
use crate::format::{Header, FRAME_COUNT_OFFSET, HEADER_SIZE, RECORD_OVERHEAD, VERSION};

/// A PointCld container handle: appender in write mode, navigator in read
/// mode.
///
/// The handle owns the single file cursor; every operation repositions it.
/// Callers that share a `Recorder` across threads must hold an external
/// exclusive lock for the full duration of each call — there is no internal
/// locking and interleaved calls will corrupt the cursor.
///
/// # On-disk layout
/// ```text
/// [HEADER: 32 bytes — magic, version, frame count, start/end time]
/// [RECORD 0] [RECORD 1] ... [RECORD N-1]
/// ```
/// Each record is bracketed by duplicate size markers carrying its total
/// length, which is what lets the navigator hop record boundaries in either
/// direction without an index structure.
#[derive(Debug)]
pub struct Recorder {
    pub(crate) file: File,
    for_write: bool,
    pub(crate) start_time: f64,
    pub(crate) end_time: f64,
    pub(crate) current_time: f64,
    /// Zero-based index of the frame at the cursor; -1 while no frame has
    /// been visited (empty container).
    pub(crate) frame_number: i64,
    pub(crate) frame_count: u32,
    /// Total on-disk byte length of the record at the cursor.
    pub(crate) frame_size: u32,
    pub(crate) info: String,
    pub(crate) depths: Vec<f32>,
    pub(crate) colors: Vec<u8>,
}

impl Recorder {
    /// Open a container.
    ///
    /// Write mode creates or truncates the file and writes a placeholder
    /// header (zero count, zero times) that [`close`](Self::close) later
    /// rewrites with final values.
    ///
    /// Read mode byte-compares the magic, loads the header, and immediately
    /// positions the cursor on frame 0 so its fields are materialized on
    /// return (a container with zero frames opens with an idle cursor).
    pub fn open(path: impl AsRef<Path>, for_write: bool) -> Result<Self> {
        let path = path.as_ref();
        if for_write {
            let mut file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            let header = Header {
                version: VERSION,
                frame_count: 0,
                start_time: 0.0,
                end_time: 0.0,
            };
            file.write_all(&header.to_bytes())?;
            debug!("created container {:?}", path);
            Ok(Self::with_header(file, true, &header))
        } else {
            let mut file = File::open(path)?;
            let mut buf = [0u8; HEADER_SIZE as usize];
            file.read_exact(&mut buf)?;
            let header = Header::from_bytes(&buf)?;
            debug!(
                "opened container {:?}: version={} frames={} span=[{}, {}]",
                path, header.version, header.frame_count, header.start_time, header.end_time
            );
            let mut recorder = Self::with_header(file, false, &header);
            recorder.first()?;
            Ok(recorder)
        }
    }

    fn with_header(file: File, for_write: bool, header: &Header) -> Self {
        Self {
            file,
            for_write,
            start_time: header.start_time,
            end_time: header.end_time,
            current_time: 0.0,
            frame_number: -1,
            frame_count: header.frame_count,
            frame_size: 0,
            info: String::new(),
            depths: Vec::new(),
            colors: Vec::new(),
        }
    }

    /// Append one frame record.
    ///
    /// `colors` must hold exactly four bytes per depth sample. The record
    /// body is written to the end of storage, then the header's frame count
    /// is patched in place and the cursor returns to end of file. The two
    /// steps are not atomic: a fault between them leaves a trailing record
    /// the header does not yet count.
    pub fn record(&mut self, time: f64, info: &str, depths: &[f32], colors: &[u8]) -> Result<()> {
        if !self.for_write {
            return Err(Error::InvalidState("container is open for reading"));
        }
        if colors.len() != depths.len() * 4 {
            return Err(Error::Format(format!(
                "color buffer is {} bytes for {} points, expected {}",
                colors.len(),
                depths.len(),
                depths.len() * 4
            )));
        }

        self.file.seek(SeekFrom::End(0))?;

        if self.frame_count == 0 {
            self.start_time = time;
        }
        self.current_time = time;
        self.end_time = time;

        let index = self.frame_count;
        self.frame_number = index as i64;
        self.frame_count += 1;

        let size = info.len() as u32 + depths.len() as u32 * 8 + RECORD_OVERHEAD;
        self.frame_size = size;

        self.file.write_u32::<BigEndian>(size)?;
        self.file.write_u32::<BigEndian>(index)?;
        self.file.write_u64::<BigEndian>(time.to_bits())?;
        write_field(&mut self.file, info.as_bytes())?;
        write_field(&mut self.file, &depths_to_bytes(depths))?;
        write_field(&mut self.file, colors)?;
        self.file.write_u32::<BigEndian>(size)?;

        // Keep the header count in step with the data, then park the cursor
        // at the end so the next append starts from a clean position.
        self.file.seek(SeekFrom::Start(FRAME_COUNT_OFFSET))?;
        self.file.write_u32::<BigEndian>(self.frame_count)?;
        self.file.seek(SeekFrom::End(0))?;

        trace!("appended frame {index} at t={time} ({size} bytes)");
        Ok(())
    }

    /// Close the container. In write mode this seals the header — frame
    /// count, start time, and end time are rewritten with final values.
    /// Read mode just releases the handle.
    ///
    /// Dropping a write-mode `Recorder` without calling `close` leaves the
    /// start/end times at their placeholder values.
    pub fn close(mut self) -> Result<()> {
        if self.for_write {
            self.file.seek(SeekFrom::Start(FRAME_COUNT_OFFSET))?;
            self.file.write_u32::<BigEndian>(self.frame_count)?;
            self.file.write_u64::<BigEndian>(self.start_time.to_bits())?;
            self.file.write_u64::<BigEndian>(self.end_time.to_bits())?;
            self.file.flush()?;
            debug!(
                "sealed container: frames={} span=[{}, {}]",
                self.frame_count, self.start_time, self.end_time
            );
        }
        Ok(())
    }

    // ── Cursor accessors ───────────────────────────────────────────────

    /// Whether the container was opened for writing.
    #[inline]
    pub fn for_write(&self) -> bool {
        self.for_write
    }

    /// Timestamp of the first recorded frame.
    #[inline]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Timestamp of the most recently recorded frame.
    #[inline]
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Timestamp of the frame at the cursor.
    #[inline]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Zero-based index of the frame at the cursor, or -1 when the
    /// container is empty.
    #[inline]
    pub fn frame_number(&self) -> i64 {
        self.frame_number
    }

    /// Total number of frame records in the container.
    #[inline]
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// On-disk byte length of the record at the cursor.
    #[inline]
    pub fn frame_size(&self) -> u32 {
        self.frame_size
    }

    /// Info string of the frame at the cursor. Stale after skip-mode
    /// navigation, which never materializes payloads.
    #[inline]
    pub fn info(&self) -> &str {
        &self.info
    }

    /// Depth buffer of the frame at the cursor, one sample per point.
    /// Stale after skip-mode navigation.
    #[inline]
    pub fn depths(&self) -> &[f32] {
        &self.depths
    }

    /// Color buffer of the frame at the cursor, four bytes per point.
    /// Stale after skip-mode navigation.
    #[inline]
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }
}
