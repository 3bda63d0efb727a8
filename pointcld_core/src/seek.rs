//! Frame navigation.
//!
//! There is no frame index on disk. The cursor moves by hopping record
//! boundaries: forward reads consume a record's leading size marker and
//! either decode the body or seek past it; backward hops re-read the
//! trailing size marker sitting just before the file offset and jump back
//! by exactly that many bytes. [`Recorder::seek`] picks whichever of the
//! three walks — from the first record, from end of file, or from the
//! current cursor — touches the fewest records.

use std::io::{Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};
use log::trace;

use crate::error::{Error, Result};
use crate::field::{depths_from_bytes, read_field};
use crate::format::{HEADER_SIZE, MAX_INFO_LEN, RECORD_HEAD_SIZE, RECORD_OVERHEAD};
use crate::recorder::Recorder;

/// Reference point for [`Recorder::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Absolute frame index.
    Start,
    /// Relative to the frame at the cursor.
    Current,
    /// Relative to one past the last frame.
    End,
}

impl Recorder {
    /// Read the record starting at the current file offset.
    ///
    /// In skip mode only the leading size, index, and timestamp are decoded;
    /// the rest of the record is seeked over and the cached info/depths/
    /// colors are left untouched. Either way the offset ends up at the start
    /// of the following record.
    pub fn read_frame(&mut self, skip: bool) -> Result<()> {
        let size = self.file.read_u32::<BigEndian>()?;
        let index = self.file.read_u32::<BigEndian>()?;
        let time = f64::from_bits(self.file.read_u64::<BigEndian>()?);
        if size < RECORD_OVERHEAD {
            return Err(Error::Format(format!(
                "record size {size} is below the fixed overhead {RECORD_OVERHEAD}"
            )));
        }

        if skip {
            self.file
                .seek(SeekFrom::Current((size - RECORD_HEAD_SIZE) as i64))?;
            self.current_time = time;
            self.frame_number = index as i64;
            self.frame_size = size;
            return Ok(());
        }

        let info = read_field(&mut self.file, Some(MAX_INFO_LEN))?;
        let info = String::from_utf8(info)
            .map_err(|_| Error::Format("info field is not valid UTF-8".into()))?;
        let depths = depths_from_bytes(&read_field(&mut self.file, None)?)?;
        let colors = read_field(&mut self.file, None)?;
        // Trailing marker; consumed only to move the offset past the record
        // boundary onto the next record. The cursor size comes from the
        // leading marker in both modes.
        self.file.read_u32::<BigEndian>()?;

        self.current_time = time;
        self.frame_number = index as i64;
        self.frame_size = size;
        self.info = info;
        self.depths = depths;
        self.colors = colors;
        Ok(())
    }

    /// Read the record at the current offset — forward navigation is just
    /// [`read_frame`](Self::read_frame) in place.
    #[inline]
    pub fn next_frame(&mut self, skip: bool) -> Result<()> {
        self.read_frame(skip)
    }

    /// Make the frame before the current one current: hop backward over the
    /// record the offset sits after and over its predecessor, then read.
    pub fn prev_frame(&mut self, skip: bool) -> Result<()> {
        self.hop_back()?;
        self.hop_back()?;
        self.read_frame(skip)
    }

    /// Move the file offset from a record boundary to the start of the
    /// record that ends there, using the trailing size marker.
    fn hop_back(&mut self) -> Result<()> {
        let pos = self.file.stream_position()?;
        if pos < HEADER_SIZE + 4 {
            return Err(Error::Format(
                "backward hop before the first record".into(),
            ));
        }
        self.file.seek(SeekFrom::Current(-4))?;
        let size = self.file.read_u32::<BigEndian>()? as u64;
        if size == 0 {
            return Err(Error::Format("zero trailing size marker".into()));
        }
        if pos < HEADER_SIZE + size {
            return Err(Error::Format(format!(
                "trailing size marker {size} points past the container header"
            )));
        }
        self.file.seek(SeekFrom::Start(pos - size))?;
        Ok(())
    }

    /// Position the cursor on a frame.
    ///
    /// The target index is resolved from `count` and `whence`, then clamped
    /// into `[0, frame_count - 1]` — out-of-range targets never fail. On an
    /// empty container the clamp resolves to the idle cursor and the seek
    /// is a successful no-op, as is any seek that already sits on its
    /// target.
    ///
    /// Otherwise the cheapest of three walks is taken; every intermediate
    /// record is traversed in skip mode and only the target is decoded.
    /// A failed hop aborts the seek with the underlying error and leaves
    /// the cursor unspecified.
    pub fn seek(&mut self, count: i64, whence: Whence) -> Result<()> {
        let mut off = match whence {
            Whence::Start => count,
            Whence::Current => self.frame_number + count,
            Whence::End => self.frame_count as i64 + count,
        };

        if off < 0 {
            off = 0;
        }
        if off >= self.frame_count as i64 {
            off = self.frame_count as i64 - 1;
        }
        if off == self.frame_number {
            return Ok(());
        }

        let dist_start = off;
        let dist_current = (self.frame_number - off).abs();
        let dist_end = self.frame_count as i64 - off;

        if dist_start < dist_current && dist_start <= dist_end {
            trace!("seek to {off}: forward from start, {} reads", dist_start + 1);
            self.file.seek(SeekFrom::Start(HEADER_SIZE))?;
            for remaining in (0..=dist_start).rev() {
                self.next_frame(remaining != 0)?;
            }
        } else if dist_end <= dist_start && dist_end < dist_current {
            trace!("seek to {off}: backward from end, {dist_end} reads");
            self.file.seek(SeekFrom::End(0))?;
            // Seed the walk on the last record; end of file sits one past it,
            // so the first backward read is a single hop.
            self.hop_back()?;
            self.read_frame(dist_end != 1)?;
            for remaining in (0..dist_end - 1).rev() {
                self.prev_frame(remaining != 0)?;
            }
        } else {
            trace!(
                "seek to {off}: stepping from frame {}, {dist_current} reads",
                self.frame_number
            );
            for remaining in (0..dist_current).rev() {
                if off > self.frame_number {
                    self.next_frame(remaining != 0)?;
                } else {
                    self.prev_frame(remaining != 0)?;
                }
            }
        }
        Ok(())
    }

    /// Position on frame 0.
    pub fn first(&mut self) -> Result<()> {
        self.seek(0, Whence::Start)
    }

    /// Position on the last frame.
    pub fn last(&mut self) -> Result<()> {
        self.seek(0, Whence::End)
    }

    /// Advance by exactly one frame. The count argument is accepted for
    /// interface compatibility with the host API but is ignored; a step is
    /// always a single frame.
    pub fn next(&mut self, _count: i64) -> Result<()> {
        self.seek(1, Whence::Current)
    }

    /// Step back by exactly one frame. As with [`next`](Self::next), the
    /// count argument is ignored.
    pub fn prev(&mut self, _count: i64) -> Result<()> {
        self.seek(-1, Whence::Current)
    }
}
