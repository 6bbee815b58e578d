use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use crate::error::MemBufError;
use crate::tracker::TrackedAlloc;

/// Above this size an owned buffer is considered "large" purely for
/// tracking purposes (real huge-page mmap allocation is not available
/// portably; see DESIGN.md for the simplification this represents).
const LARGE_OWNED_THRESHOLD: usize = 16 * 1024 * 1024;

enum Backing {
    Owned(Arc<Vec<u8>>, Option<Arc<TrackedAlloc>>),
    Mapped(Arc<Mmap>),
}

impl Backing {
    fn as_slice(&self) -> &[u8] {
        match self {
            Backing::Owned(v, _) => v,
            Backing::Mapped(m) => m,
        }
    }
}

impl Clone for Backing {
    fn clone(&self) -> Self {
        match self {
            Backing::Owned(v, t) => Backing::Owned(Arc::clone(v), t.clone()),
            Backing::Mapped(m) => Backing::Mapped(Arc::clone(m)),
        }
    }
}

/// A shared-ownership window into an owned or memory-mapped buffer.
#[derive(Clone)]
struct SharedWindow {
    backing: Backing,
    offset: usize,
    len: usize,
}

impl SharedWindow {
    fn as_slice(&self) -> &[u8] {
        &self.backing.as_slice()[self.offset..self.offset + self.len]
    }
}

/// A memory buffer: owned, mmap-backed, or borrowed from some shorter-lived
/// slice. All three expose the same `data()`/`size()`/`subbuf()` surface, so
/// callers that only ever read bytes don't need to know which kind they
/// hold. Seqset, ref-map and seq-repo readers all hand back `MemBuf::Mapped`
/// buffers; the builders that produce those files work with `MemBuf::Owned`.
#[derive(Clone)]
pub enum MemBuf<'a> {
    Owned(SharedWindow),
    Mapped(SharedWindow),
    Borrowed(&'a [u8]),
}

impl<'a> MemBuf<'a> {
    #[must_use]
    pub fn new_owned(data: Vec<u8>) -> Self {
        let len = data.len();
        let tracked = if len >= LARGE_OWNED_THRESHOLD {
            Some(Arc::new(TrackedAlloc::new("membuf::owned", len)))
        } else {
            None
        };
        MemBuf::Owned(SharedWindow { backing: Backing::Owned(Arc::new(data), tracked), offset: 0, len })
    }

    #[must_use]
    pub fn borrowed(data: &'a [u8]) -> Self {
        MemBuf::Borrowed(data)
    }

    /// Memory-map a file read-only. The map is reference-counted so cheap
    /// `subbuf` windows can be handed out without re-mapping or copying.
    pub fn map_file(path: impl AsRef<Path>) -> Result<MemBuf<'static>, MemBufError> {
        let path_ref = path.as_ref();
        let file = std::fs::File::open(path_ref)
            .map_err(|source| MemBufError::Mmap { path: path_ref.display().to_string(), source })?;
        // Safety: the file is not expected to be concurrently truncated while
        // mapped; seqset/ref-map/seq-repo files are write-once-then-read-only.
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|source| MemBufError::Mmap { path: path_ref.display().to_string(), source })?;
        let len = mmap.len();
        Ok(MemBuf::Mapped(SharedWindow { backing: Backing::Mapped(Arc::new(mmap)), offset: 0, len }))
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        match self {
            MemBuf::Owned(w) | MemBuf::Mapped(w) => w.as_slice(),
            MemBuf::Borrowed(s) => s,
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.data().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// A non-owning window into `len` bytes starting at `offset`. Shares the
    /// same backing storage: no copy, no re-map.
    pub fn subbuf(&self, offset: usize, len: usize) -> Result<MemBuf<'a>, MemBufError> {
        let size = self.size();
        if offset + len > size {
            return Err(MemBufError::OutOfBounds { offset, len, size });
        }
        Ok(match self {
            MemBuf::Owned(w) => MemBuf::Owned(SharedWindow { backing: w.backing.clone(), offset: w.offset + offset, len }),
            MemBuf::Mapped(w) => MemBuf::Mapped(SharedWindow { backing: w.backing.clone(), offset: w.offset + offset, len }),
            MemBuf::Borrowed(s) => MemBuf::Borrowed(&s[offset..offset + len]),
        })
    }
}

/// Page a memory-mapped region into the OS page cache via strided reads,
/// without materializing the whole region as a contiguous touch. Intended
/// for warming up large seqset/ref-map files before the random-access
/// phase of a run. This is a best-effort prefault: unlike the residency
/// check in `original_source`'s `cachelist` (backed by `mincore`), no
/// portable residency probe is used here, so every call strides the full
/// region (see DESIGN.md).
pub fn cachelist(buf: &MemBuf<'_>, stride: usize) {
    let data = buf.data();
    if data.is_empty() || stride == 0 {
        return;
    }
    let mut touched: u64 = 0;
    let mut i = 0;
    while i < data.len() {
        touched = touched.wrapping_add(u64::from(data[i]));
        i += stride;
    }
    // Prevent the optimizer from eliding the reads entirely.
    std::hint::black_box(touched);
}
