//! # Memory Module
//!
//! Backing storage for expression trees comes in two classes.  Ordinary blocks
//! are plain heap allocations.  Sensitive blocks hold material derived from
//! private keys: they are locked against swap where the platform permits, and
//! their contents are wiped before the pages go back to the allocator.
//!
//! A `Block` is a fixed-size, zero-filled allocation.  Growth always moves to a
//! fresh allocation of the same class; whatever storage is abandoned by `grow`
//! or `upgrade` gets the same wipe treatment as a release.  Allocation failure
//! aborts the process, which is the correct stance for a crypto core.

use log::warn;
use zeroize::Zeroize;

/// The memory class is chosen when a block is obtained and can change only by
/// upgrading from `Ordinary` to `Sensitive`, never the reverse.
#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub enum MemClass {
    Ordinary,
    Sensitive
}

/// An owned allocation of a given class.  The length is fixed at creation or
/// by `grow`; all bytes are initialized to zero.
pub struct Block {
    buf: Vec<u8>,
    class: MemClass
}

#[cfg(unix)]
fn lock_pages(buf: &[u8]) {
    if buf.len()==0 {
        return;
    }
    let rc = unsafe { libc::mlock(buf.as_ptr() as *const libc::c_void,buf.len()) };
    if rc != 0 {
        // typically RLIMIT_MEMLOCK; the block still gets wiped on release
        warn!("could not lock {} bytes of sensitive memory",buf.len());
    }
}

#[cfg(unix)]
fn unlock_pages(buf: &[u8]) {
    if buf.len()==0 {
        return;
    }
    unsafe { libc::munlock(buf.as_ptr() as *const libc::c_void,buf.len()) };
}

#[cfg(not(unix))]
fn lock_pages(_buf: &[u8]) {
}

#[cfg(not(unix))]
fn unlock_pages(_buf: &[u8]) {
}

impl Block {
    /// Obtain a zero-filled block of `size` bytes in the given class.
    pub fn obtain(size: usize,class: MemClass) -> Self {
        let buf = vec![0;size];
        if class==MemClass::Sensitive {
            lock_pages(&buf);
        }
        Self { buf, class }
    }
    /// Grow (or shrink) to `new_size` bytes, preserving class and contents.
    /// This may move the block; the old storage is wiped if sensitive.
    pub fn grow(&mut self,new_size: usize) {
        let mut new_buf = vec![0;new_size];
        let keep = usize::min(self.buf.len(),new_size);
        new_buf[..keep].copy_from_slice(&self.buf[..keep]);
        if self.class==MemClass::Sensitive {
            lock_pages(&new_buf);
            unlock_pages(&self.buf);
            self.buf.zeroize();
        }
        self.buf = new_buf;
    }
    /// Move an ordinary block into the sensitive class.  Contents are copied
    /// to locked storage and the ordinary storage is wiped.  No effect if the
    /// block is already sensitive.
    pub fn upgrade(&mut self) {
        if self.class==MemClass::Sensitive {
            return;
        }
        let mut new_buf = self.buf.clone();
        lock_pages(&new_buf);
        std::mem::swap(&mut self.buf,&mut new_buf);
        new_buf.zeroize();
        self.class = MemClass::Sensitive;
    }
    pub fn is_sensitive(&self) -> bool {
        self.class==MemClass::Sensitive
    }
    pub fn len(&self) -> usize {
        self.buf.len()
    }
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        if self.class==MemClass::Sensitive {
            unlock_pages(&self.buf);
            self.buf.zeroize();
        }
    }
}

#[test]
fn obtain_and_grow() {
    let mut blk = Block::obtain(4,MemClass::Ordinary);
    blk.bytes_mut().copy_from_slice(&[1,2,3,4]);
    blk.grow(8);
    assert_eq!(blk.len(),8);
    assert_eq!(blk.bytes(),&[1,2,3,4,0,0,0,0]);
    assert!(!blk.is_sensitive());
}

#[test]
fn upgrade_preserves_contents() {
    let mut blk = Block::obtain(3,MemClass::Ordinary);
    blk.bytes_mut().copy_from_slice(&[9,8,7]);
    blk.upgrade();
    assert!(blk.is_sensitive());
    assert_eq!(blk.bytes(),&[9,8,7]);
    blk.grow(5);
    assert!(blk.is_sensitive());
    assert_eq!(blk.bytes(),&[9,8,7,0,0]);
}
