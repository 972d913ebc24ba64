use std::io::{self, Read};

use tracing::debug;

/// ID3v2 magic bytes: "ID3".
const ID3V2_MAGIC: [u8; 3] = *b"ID3";

/// Length of the ID3v2 header, and of the optional footer.
const ID3V2_HEADER_LEN: usize = 10;

/// Footer-present bit in the ID3v2 flags byte.
const ID3V2_FLAG_FOOTER: u8 = 0x10;

/// Length of a trailing ID3v1 tag.
pub const ID3V1_LEN: usize = 128;

/// Length of an MPEG audio frame header.
pub const FRAME_HEADER_LEN: usize = 4;

/// Largest layer 1/2/3 frame: MPEG-2.5 layer II, 160 kbps, 8000 Hz, padded.
pub const MAX_FRAME_LEN: usize = 2881;

/// Bitrates in kbps, indexed by the 4-bit bitrate field (0 = free format).
const BITRATES_V1_L1: [u16; 15] = [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448];
const BITRATES_V1_L2: [u16; 15] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384];
const BITRATES_V1_L3: [u16; 15] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
const BITRATES_V2_L1: [u16; 15] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256];
const BITRATES_V2_L23: [u16; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

/// MPEG-1 sample rates; MPEG-2 halves them, MPEG-2.5 quarters them.
const SAMPLE_RATES_V1: [u32; 3] = [44100, 48000, 32000];

/// Byte length of the frame starting with `header`, padding included.
///
/// None for anything that is not a fixed-bitrate layer 1/2/3 header
/// (free-format frames carry no length).
pub fn frame_len(header: &[u8]) -> Option<usize> {
    let &[b0, b1, b2, _] = header.get(..FRAME_HEADER_LEN)? else {
        return None;
    };
    if b0 != 0xFF || b1 & 0xE0 != 0xE0 {
        return None;
    }

    // 3 = MPEG-1, 2 = MPEG-2, 0 = MPEG-2.5, 1 = reserved
    let version = (b1 >> 3) & 0b11;
    // 3 = layer I, 2 = layer II, 1 = layer III, 0 = reserved
    let layer = (b1 >> 1) & 0b11;
    let bitrate_idx = (b2 >> 4) as usize;
    let rate_idx = ((b2 >> 2) & 0b11) as usize;
    let padding = ((b2 >> 1) & 1) as u32;
    if version == 1 || layer == 0 || bitrate_idx == 0 || bitrate_idx == 15 || rate_idx == 3 {
        return None;
    }

    let mpeg1 = version == 3;
    let table = match (mpeg1, layer) {
        (true, 3) => &BITRATES_V1_L1,
        (true, 2) => &BITRATES_V1_L2,
        (true, _) => &BITRATES_V1_L3,
        (false, 3) => &BITRATES_V2_L1,
        (false, _) => &BITRATES_V2_L23,
    };
    let bitrate = table[bitrate_idx] as u32 * 1000;
    let sample_rate = SAMPLE_RATES_V1[rate_idx]
        >> match version {
            3 => 0,
            2 => 1,
            _ => 2,
        };

    let len = match layer {
        3 => (12 * bitrate / sample_rate + padding) * 4,
        1 if !mpeg1 => 72 * bitrate / sample_rate + padding,
        _ => 144 * bitrate / sample_rate + padding,
    };
    Some(len as usize)
}

/// Whether `input` ends in a 128-byte ID3v1 tag.
pub fn has_id3v1_tail(input: &[u8]) -> bool {
    input.len() >= ID3V1_LEN && input[input.len() - ID3V1_LEN..].starts_with(b"TAG")
}

/// Total length of an ID3v2 tag (header + body + footer), if `header` is one.
pub fn id3v2_tag_len(header: &[u8; ID3V2_HEADER_LEN]) -> Option<u64> {
    if header[..3] != ID3V2_MAGIC {
        return None;
    }
    // Version bytes are never 0xFF and the size is syncsafe (high bits clear)
    if header[3] == 0xFF || header[4] == 0xFF || header[6..].iter().any(|&b| b & 0x80 != 0) {
        return None;
    }
    let size = ((header[6] as u64) << 21)
        | ((header[7] as u64) << 14)
        | ((header[8] as u64) << 7)
        | (header[9] as u64);
    let footer = if header[5] & ID3V2_FLAG_FOOTER != 0 {
        ID3V2_HEADER_LEN as u64
    } else {
        0
    };
    Some(ID3V2_HEADER_LEN as u64 + size + footer)
}

/// Read the start of the stream, discarding a leading ID3v2 tag.
///
/// Returns the bytes already pulled from `reader` that belong to the audio
/// data: empty when a tag was skipped, otherwise the (up to 10) lookahead
/// bytes.
pub fn skip_id3v2<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(ID3V2_HEADER_LEN);
    reader
        .by_ref()
        .take(ID3V2_HEADER_LEN as u64)
        .read_to_end(&mut head)?;

    let Ok(header) = <&[u8; ID3V2_HEADER_LEN]>::try_from(head.as_slice()) else {
        return Ok(head);
    };
    let Some(tag_len) = id3v2_tag_len(header) else {
        return Ok(head);
    };

    let body = tag_len - ID3V2_HEADER_LEN as u64;
    let skipped = io::copy(&mut reader.by_ref().take(body), &mut io::sink())?;
    debug!(tag_len, skipped, "skipped ID3v2 tag");
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tag_header(flags: u8, size: [u8; 4]) -> [u8; 10] {
        [b'I', b'D', b'3', 4, 0, flags, size[0], size[1], size[2], size[3]]
    }

    #[test]
    fn syncsafe_size() {
        // 0x01 0x00 0x00 0x7F -> (1 << 21) + 127
        let header = tag_header(0, [0x01, 0x00, 0x00, 0x7F]);
        assert_eq!(id3v2_tag_len(&header), Some(10 + (1 << 21) + 127));
    }

    #[test]
    fn footer_adds_ten_bytes() {
        let header = tag_header(ID3V2_FLAG_FOOTER, [0, 0, 0, 20]);
        assert_eq!(id3v2_tag_len(&header), Some(10 + 20 + 10));
    }

    #[test]
    fn rejects_non_syncsafe_size() {
        let header = tag_header(0, [0, 0, 0x80, 0]);
        assert_eq!(id3v2_tag_len(&header), None);
    }

    #[test]
    fn rejects_mpeg_sync() {
        let header = [0xFF, 0xFB, 0x90, 0x00, 0, 0, 0, 0, 0, 0];
        assert_eq!(id3v2_tag_len(&header), None);
    }

    #[test]
    fn frame_lengths() {
        // MPEG-1 layer III, 128 kbps, 44100 Hz, unpadded and padded
        assert_eq!(frame_len(&[0xFF, 0xFB, 0x90, 0x00]), Some(417));
        assert_eq!(frame_len(&[0xFF, 0xFB, 0x92, 0x00]), Some(418));
        // MPEG-1 layer I, 448 kbps, 32000 Hz, padded
        assert_eq!(frame_len(&[0xFF, 0xFF, 0xEA, 0x00]), Some((168 + 1) * 4));
        // MPEG-2 layer III, 64 kbps, 22050 Hz
        assert_eq!(frame_len(&[0xFF, 0xF3, 0x80, 0x00]), Some(208));
        // MPEG-2.5 layer II, 160 kbps, 8000 Hz, padded
        assert_eq!(frame_len(&[0xFF, 0xE5, 0xEA, 0x00]), Some(MAX_FRAME_LEN));
    }

    #[test]
    fn frame_len_rejects_invalid_headers() {
        assert_eq!(frame_len(&[0xFF, 0xFB, 0x00, 0x00]), None); // free format
        assert_eq!(frame_len(&[0xFF, 0xFB, 0xF0, 0x00]), None); // bad bitrate
        assert_eq!(frame_len(&[0xFF, 0xFB, 0x9C, 0x00]), None); // bad sample rate
        assert_eq!(frame_len(&[0xFF, 0xF9, 0x90, 0x00]), None); // reserved layer
        assert_eq!(frame_len(&[0xFF, 0xEB, 0x90, 0x00]), None); // reserved version
        assert_eq!(frame_len(&[0x00, 0xFB, 0x90, 0x00]), None);
        assert_eq!(frame_len(&[0xFF, 0xFB]), None);
    }

    #[test]
    fn id3v1_tail() {
        let mut data = vec![0u8; 400];
        assert!(!has_id3v1_tail(&data));
        data[400 - 128..400 - 125].copy_from_slice(b"TAG");
        assert!(has_id3v1_tail(&data));
        assert!(!has_id3v1_tail(b"TAG"));
    }

    #[test]
    fn skips_tag_and_leaves_audio() {
        let mut data = tag_header(0, [0, 0, 0, 5]).to_vec();
        data.extend_from_slice(&[0xAA; 5]);
        data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);

        let mut cursor = Cursor::new(data);
        let lookahead = skip_id3v2(&mut cursor).unwrap();
        assert!(lookahead.is_empty());

        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, [0xFF, 0xFB, 0x90, 0x00]);
    }

    #[test]
    fn untagged_stream_returns_lookahead() {
        let data: Vec<u8> = (0..16).collect();
        let mut cursor = Cursor::new(data);
        let lookahead = skip_id3v2(&mut cursor).unwrap();
        assert_eq!(lookahead, (0..10).collect::<Vec<u8>>());
        assert_eq!(cursor.position(), 10);
    }

    #[test]
    fn short_stream_returns_everything() {
        let mut cursor = Cursor::new(vec![b'I', b'D', b'3']);
        assert_eq!(skip_id3v2(&mut cursor).unwrap(), b"ID3");
    }
}
