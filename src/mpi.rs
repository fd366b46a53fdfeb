//! # Big Integer Module
//!
//! The minimal big-integer surface the S-expression core consumes: scanning
//! atom bytes into a magnitude, printing a magnitude back to wire bytes, and
//! the two comparison routines whose exact results downstream callers match
//! on.  This is a bridge, not an arithmetic package; there is no add, mul,
//! or modular anything here.
//!
//! A magnitude is an ordered sequence of 64-bit limbs in little-endian limb
//! order, kept normalized (no high zero limbs), plus a sign.  Integers
//! flagged secure wipe their limbs on release, and their insertion into a
//! tree via `%m` moves the whole tree to sensitive storage.

use hex;
use zeroize::Zeroize;

pub type Limb = u64;
const LIMB_BYTES: usize = 8;

#[derive(thiserror::Error,Debug,PartialEq)]
pub enum MpiError {
    #[error("invalid digit in big integer encoding")]
    BadDigit
}

/// Wire formats understood by `scan` and `print`.  `Std` is the compact
/// big-endian form used inside canonical S-expressions; `Usg` is the same
/// unsigned bytes; `Hex` is ASCII hex digits, case-insensitive.
#[derive(PartialEq,Eq,Clone,Copy,Debug,Default)]
pub enum MpiFormat {
    #[default]
    Std,
    Usg,
    Hex
}

pub struct Mpi {
    limbs: Vec<Limb>,
    negative: bool,
    secure: bool
}

fn limbs_from_be(bytes: &[u8]) -> Vec<Limb> {
    let mut limbs: Vec<Limb> = Vec::new();
    let mut chunk_end = bytes.len();
    while chunk_end > 0 {
        let chunk_start = chunk_end.saturating_sub(LIMB_BYTES);
        let mut limb: Limb = 0;
        for &b in &bytes[chunk_start..chunk_end] {
            limb = (limb << 8) | b as Limb;
        }
        limbs.push(limb);
        chunk_end = chunk_start;
    }
    limbs
}

impl Mpi {
    pub fn zero() -> Self {
        Self { limbs: Vec::new(), negative: false, secure: false }
    }
    pub fn from_uint(v: Limb) -> Self {
        let mut ans = Self { limbs: vec![v], negative: false, secure: false };
        ans.normalize();
        ans
    }
    /// Flip the sign.  Zero stays non-negative.
    pub fn negate(&mut self) {
        if self.nlimbs() > 0 {
            self.negative = !self.negative;
        }
    }
    pub fn is_negative(&self) -> bool {
        self.negative
    }
    /// Mark the integer as key material; its limbs are wiped on release.
    pub fn set_secure(&mut self,flag: bool) {
        self.secure = flag;
    }
    pub fn is_secure(&self) -> bool {
        self.secure
    }
    /// Trim high zero limbs.  Constructors maintain this invariant; it is
    /// exposed because scanned material can arrive with leading zero bytes.
    pub fn normalize(&mut self) {
        while let Some(&0) = self.limbs.last() {
            self.limbs.pop();
        }
        if self.limbs.len()==0 {
            self.negative = false;
        }
    }
    fn nlimbs(&self) -> usize {
        self.limbs.len()
    }
    /// Scan wire bytes into a non-negative integer.
    pub fn scan(bytes: &[u8],fmt: MpiFormat) -> Result<Self,MpiError> {
        let magnitude = match fmt {
            MpiFormat::Std | MpiFormat::Usg => bytes.to_vec(),
            MpiFormat::Hex => {
                let mut digits: Vec<u8> = Vec::with_capacity(bytes.len()+1);
                if bytes.len() % 2 == 1 {
                    digits.push(b'0');
                }
                digits.extend_from_slice(bytes);
                match hex::decode(&digits) {
                    Ok(v) => v,
                    Err(_) => return Err(MpiError::BadDigit)
                }
            }
        };
        let mut ans = Self { limbs: limbs_from_be(&magnitude), negative: false, secure: false };
        ans.normalize();
        Ok(ans)
    }
    /// Print the magnitude in the requested format.  `Std` and `Usg` give
    /// the minimal big-endian bytes (zero prints as no bytes at all); `Hex`
    /// gives uppercase digit pairs.
    pub fn print(&self,fmt: MpiFormat) -> Vec<u8> {
        let mag = self.magnitude_be();
        match fmt {
            MpiFormat::Std | MpiFormat::Usg => mag,
            MpiFormat::Hex => {
                if mag.len()==0 {
                    return b"00".to_vec();
                }
                let mut out = String::with_capacity(2*mag.len());
                for b in mag {
                    out += &format!("{:02X}",b);
                }
                out.into_bytes()
            }
        }
    }
    fn magnitude_be(&self) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::with_capacity(LIMB_BYTES*self.nlimbs());
        for i in (0..self.nlimbs()).rev() {
            out.extend_from_slice(&self.limbs[i].to_be_bytes());
        }
        let first = out.iter().position(|&b| b != 0).unwrap_or(out.len());
        out.split_off(first)
    }
    /// Signed comparison.  Positive result means `self` is greater, negative
    /// means less, zero means equal.  When both operands are negative with
    /// different limb counts the result is the sum of the two limb counts, a
    /// long-standing wart that callers have come to depend on.
    pub fn cmp(&self,other: &Mpi) -> i32 {
        let usize_ = self.nlimbs();
        let vsize = other.nlimbs();
        if !self.negative && other.negative {
            return 1;
        }
        if self.negative && !other.negative {
            return -1;
        }
        if usize_ != vsize && !self.negative && !other.negative {
            return usize_ as i32 - vsize as i32;
        }
        if usize_ != vsize && self.negative && other.negative {
            return (vsize + usize_) as i32;
        }
        if usize_==0 {
            return 0;
        }
        let cmp = cmp_limbs(&self.limbs,&other.limbs);
        if cmp==0 {
            return 0;
        }
        if (cmp < 0) == self.negative {
            return 1;
        }
        -1
    }
    /// Compare against a single unsigned word.
    pub fn cmp_ui(&self,v: Limb) -> i32 {
        let n = self.nlimbs();
        if n==0 && v==0 {
            return 0;
        }
        if self.negative {
            return -1;
        }
        if n > 1 {
            return 1;
        }
        let d0 = match n {
            0 => 0,
            _ => self.limbs[0]
        };
        if d0==v {
            0
        } else if d0 > v {
            1
        } else {
            -1
        }
    }
}

/// Magnitude comparison of equal-length limb sequences, most significant
/// limb first.
fn cmp_limbs(u: &[Limb],v: &[Limb]) -> i32 {
    for i in (0..u.len()).rev() {
        if u[i] != v[i] {
            return match u[i] > v[i] {
                true => 1,
                false => -1
            };
        }
    }
    0
}

impl PartialEq for Mpi {
    fn eq(&self,other: &Self) -> bool {
        self.limbs==other.limbs && self.negative==other.negative
    }
}

impl std::fmt::Debug for Mpi {
    fn fmt(&self,f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = match self.negative {
            true => "-",
            false => ""
        };
        write!(f,"{}0x{}",sign,String::from_utf8_lossy(&self.print(MpiFormat::Hex)))
    }
}

impl Drop for Mpi {
    fn drop(&mut self) {
        if self.secure {
            self.limbs.zeroize();
        }
    }
}

#[cfg(test)]
fn mpi(hex_str: &str) -> Mpi {
    Mpi::scan(hex_str.as_bytes(),MpiFormat::Hex).expect("hex error")
}

#[cfg(test)]
fn neg(hex_str: &str) -> Mpi {
    let mut m = mpi(hex_str);
    m.negate();
    m
}

#[test]
fn scan_and_print() {
    let m = mpi("DEADBEEF");
    assert_eq!(m.print(MpiFormat::Std),vec![0xde,0xad,0xbe,0xef]);
    assert_eq!(m.print(MpiFormat::Hex),b"DEADBEEF".to_vec());
    // leading zeros normalize away
    let m = Mpi::scan(&[0,0,1,2],MpiFormat::Std).unwrap();
    assert_eq!(m.print(MpiFormat::Std),vec![1,2]);
    // odd digit counts get an implied leading zero
    assert_eq!(mpi("ABC").print(MpiFormat::Hex),b"0ABC".to_vec());
    assert_eq!(Mpi::zero().print(MpiFormat::Std),Vec::<u8>::new());
    assert!(Mpi::scan(b"XY",MpiFormat::Hex).is_err());
}

#[test]
fn compare_signs() {
    assert_eq!(mpi("05").cmp(&neg("05")),1);
    assert_eq!(neg("05").cmp(&mpi("05")),-1);
    assert_eq!(mpi("05").cmp(&mpi("05")),0);
    assert_eq!(Mpi::zero().cmp(&Mpi::zero()),0);
}

#[test]
fn compare_widths() {
    // two limbs vs one, both non-negative: limb count difference
    let wide = mpi("0123456789ABCDEF0123456789ABCDEF");
    let narrow = mpi("FF");
    assert_eq!(wide.cmp(&narrow),1);
    assert_eq!(narrow.cmp(&wide),-1);
    // both negative with different widths: the historical sum of the counts
    let mut wide = mpi("0123456789ABCDEF0123456789ABCDEF");
    wide.negate();
    assert_eq!(wide.cmp(&neg("FF")),3);
    assert_eq!(neg("FF").cmp(&wide),3);
}

#[test]
fn compare_magnitudes() {
    assert_eq!(mpi("0100").cmp(&mpi("00FF")),1);
    assert_eq!(mpi("00FF").cmp(&mpi("0100")),-1);
    // equal widths, both negative: larger magnitude is smaller
    assert_eq!(neg("0100").cmp(&neg("00FF")),-1);
    assert_eq!(neg("00FF").cmp(&neg("0100")),1);
    assert_eq!(neg("0100").cmp(&neg("0100")),0);
}

#[test]
fn compare_small() {
    assert_eq!(Mpi::zero().cmp_ui(0),0);
    assert_eq!(neg("05").cmp_ui(5),-1);
    assert_eq!(mpi("0123456789ABCDEF01").cmp_ui(1),1);
    assert_eq!(Mpi::from_uint(7).cmp_ui(7),0);
    assert_eq!(Mpi::from_uint(8).cmp_ui(7),1);
    assert_eq!(Mpi::from_uint(6).cmp_ui(7),-1);
    assert_eq!(Mpi::zero().cmp_ui(1),-1);
}
