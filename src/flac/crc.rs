//! Frame checksums
//!
//! FLAC protects every frame twice:
//! - CRC-8 (poly x^8 + x^2 + x^1 + x^0, init 0) over the frame header,
//!   stored as the last header byte
//! - CRC-16 (poly x^16 + x^15 + x^2 + x^0, init 0) over the whole frame,
//!   stored big-endian as the last two frame bytes
//!
//! Neither is reflected. Running either checksum over data that already
//! ends with its own stored checksum yields 0, which is how candidate
//! headers and frame boundaries are validated.

const CRC8_POLY: u8 = 0x07;
const CRC16_POLY: u16 = 0x8005;

static CRC8_TABLE: [u8; 256] = make_crc8_table();
static CRC16_TABLE: [u16; 256] = make_crc16_table();

const fn make_crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const fn make_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC16_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC-8 of `data`.
pub fn crc8(data: &[u8]) -> u8 {
    crc8_update(0, data)
}

/// Extend a running CRC-8 with more bytes.
pub fn crc8_update(crc: u8, data: &[u8]) -> u8 {
    data.iter()
        .fold(crc, |crc, &b| CRC8_TABLE[(crc ^ b) as usize])
}

/// CRC-16 of `data`.
pub fn crc16(data: &[u8]) -> u16 {
    crc16_update(0, data)
}

/// Extend a running CRC-16 with more bytes.
///
/// `crc16_update(crc16(a), b) == crc16(a ++ b)`, which lets the walker grow a
/// candidate frame without rescanning the bytes it already covered.
pub fn crc16_update(crc: u16, data: &[u8]) -> u16 {
    data.iter().fold(crc, |crc, &b| {
        (crc << 8) ^ CRC16_TABLE[((crc >> 8) as u8 ^ b) as usize]
    })
}
