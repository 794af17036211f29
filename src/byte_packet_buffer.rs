use crate::error::{DnsError, Result};

const MAX_LABEL_LEN: usize = 63;
const MAX_JUMPS: usize = 10;

// read cursor over a received packet. every read is checked against the slice
// length, so nothing past the end is ever touched.
pub struct BytePacketBuffer<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BytePacketBuffer<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    fn ensure(&self, start: usize, needed: usize) -> Result<()> {
        match start.checked_add(needed) {
            Some(end) if end <= self.buf.len() => Ok(()),
            _ => Err(DnsError::TruncatedMessage {
                offset: start,
                needed,
                len: self.buf.len(),
            }),
        }
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        self.ensure(pos, 0)?;
        self.pos = pos;
        Ok(())
    }

    pub fn step(&mut self, steps: usize) -> Result<()> {
        self.ensure(self.pos, steps)?;
        self.pos += steps;
        Ok(())
    }

    pub fn read(&mut self) -> Result<u8> {
        let byte = self.get(self.pos)?;
        self.pos += 1;

        Ok(byte)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_range(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_range(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_range(&mut self, len: usize) -> Result<&'a [u8]> {
        let range = self.get_range(self.pos, len)?;
        self.pos += len;
        Ok(range)
    }

    fn get(&self, pos: usize) -> Result<u8> {
        self.ensure(pos, 1)?;
        Ok(self.buf[pos])
    }

    fn get_range(&self, start: usize, len: usize) -> Result<&'a [u8]> {
        self.ensure(start, len)?;
        let buf = self.buf;
        Ok(&buf[start..start + len])
    }

    /// Reads a domain name at the current position, following compression
    /// pointers. The cursor ends up just past the name as it appears inline,
    /// i.e. past the first pointer if one was followed.
    pub fn read_qname(&mut self) -> Result<String> {
        // locally track pos because we might encounter jumps
        let mut pos = self.pos;
        let mut out = String::new();

        let mut jumped = false;
        let max_jumps = MAX_JUMPS.min(self.buf.len());
        let mut jumps_performed = 0;

        let mut delim = "";

        loop {
            let len = self.get(pos)?;

            match len & 0xC0 {
                // two most significant bits set: the remaining 14 bits of this
                // byte and the next one are an offset into the packet
                0xC0 => {
                    let b2 = self.get(pos + 1)? as usize;
                    let offset = ((len as usize & 0x3F) << 8) | b2;

                    // targets must move strictly backwards, which also rules out cycles
                    if offset >= pos {
                        return Err(DnsError::MalformedPointer {
                            offset: pos,
                            reason: "pointer does not target an earlier offset",
                        });
                    }
                    if jumps_performed >= max_jumps {
                        return Err(DnsError::MalformedPointer {
                            offset: pos,
                            reason: "too many compression pointers",
                        });
                    }

                    if !jumped {
                        self.pos = pos + 2;
                    }

                    pos = offset;
                    jumped = true;
                    jumps_performed += 1;
                }
                0x00 => {
                    pos += 1;

                    if len == 0 {
                        break;
                    }

                    let label = self.get_range(pos, len as usize)?;

                    // pre-push the delim so there is no trailing dot
                    out.push_str(delim);
                    out.push_str(&String::from_utf8_lossy(label));

                    delim = ".";

                    pos += len as usize;
                }
                _ => {
                    return Err(DnsError::MalformedPointer {
                        offset: pos,
                        reason: "reserved label type",
                    });
                }
            }
        }

        if !jumped {
            self.pos = pos;
        }
        Ok(out)
    }
}

/// Decodes the name starting at `start`, returning it with the offset of the
/// first byte after it.
pub fn decode_name(buf: &[u8], start: usize) -> Result<(String, usize)> {
    let mut buffer = BytePacketBuffer::new(buf);
    buffer.seek(start)?;
    let name = buffer.read_qname()?;
    Ok((name, buffer.pos()))
}

/// Appends `domain` to `out` as length-prefixed labels plus the zero terminator.
///
/// The root name (`""` or `"."`) is just the terminator, and one trailing dot
/// on a fully qualified name is ignored.
pub fn encode_name(domain: &str, out: &mut Vec<u8>) -> Result<()> {
    let trimmed = domain.strip_suffix('.').unwrap_or(domain);

    if !trimmed.is_empty() {
        for label in trimmed.split('.') {
            let bytes = label.as_bytes();
            if bytes.is_empty() {
                return Err(DnsError::InvalidLabel {
                    label: domain.to_string(),
                    reason: "empty label",
                });
            }
            if bytes.len() > MAX_LABEL_LEN {
                return Err(DnsError::InvalidLabel {
                    label: label.to_string(),
                    reason: "label longer than 63 bytes",
                });
            }

            out.push(bytes.len() as u8);
            out.extend_from_slice(bytes);
        }
    }

    out.push(0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(domain: &str) -> Vec<u8> {
        let mut out = Vec::new();
        encode_name(domain, &mut out).unwrap();
        out
    }

    #[test]
    fn test_encode_name() {
        assert_eq!(
            encoded("www.google.com"),
            vec![3, b'w', b'w', b'w', 6, b'g', b'o', b'o', b'g', b'l', b'e', 3, b'c', b'o', b'm', 0]
        );
    }

    #[test]
    fn test_encode_root_and_trailing_dot() {
        assert_eq!(encoded(""), vec![0]);
        assert_eq!(encoded("."), vec![0]);
        assert_eq!(encoded("example.com."), encoded("example.com"));
    }

    #[test]
    fn test_encode_rejects_bad_labels() {
        let mut out = Vec::new();
        assert!(matches!(
            encode_name("a..b", &mut out),
            Err(DnsError::InvalidLabel { .. })
        ));
        assert!(matches!(
            encode_name(".com", &mut out),
            Err(DnsError::InvalidLabel { .. })
        ));
        assert!(matches!(
            encode_name("..", &mut out),
            Err(DnsError::InvalidLabel { .. })
        ));

        let long = format!("{}.com", "a".repeat(64));
        assert!(matches!(
            encode_name(&long, &mut out),
            Err(DnsError::InvalidLabel { .. })
        ));

        let max = format!("{}.com", "a".repeat(63));
        assert!(encode_name(&max, &mut out).is_ok());
    }

    #[test]
    fn test_name_round_trip() {
        let names = [
            "example.com".to_string(),
            "a".to_string(),
            "www.Example.COM".to_string(),
            "x-1.y_2.z3.example.org".to_string(),
            format!("{}.{}", "a".repeat(63), "b".repeat(63)),
        ];

        for name in names {
            let bytes = encoded(&name);
            let (decoded, next) = decode_name(&bytes, 0).unwrap();
            assert_eq!(decoded, name);
            assert_eq!(next, bytes.len());
        }
    }

    #[test]
    fn test_decode_root() {
        assert_eq!(decode_name(&[0], 0).unwrap(), (String::new(), 1));
    }

    #[test]
    fn test_decode_compressed_name() {
        let mut data = vec![0u8; 12];
        data.extend_from_slice(&encoded("www.google.com"));
        data.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        data.extend_from_slice(&[0xC0, 0x0C]);

        let (name, next) = decode_name(&data, 33).unwrap();
        assert_eq!(name, "www.google.com");
        // only the 2-byte pointer is consumed
        assert_eq!(next, 35);
    }

    #[test]
    fn test_decode_label_then_pointer() {
        // f.example.com where "example.com" lives at offset 2
        let data = vec![
            0x01, b'f', 0x07, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0x03, b'c', b'o', b'm',
            0x00, 0x01, b'f', 0xC0, 0x02,
        ];

        let mut buffer = BytePacketBuffer::new(&data);
        buffer.seek(15).unwrap();
        assert_eq!(buffer.read_qname().unwrap(), "f.example.com");
        assert_eq!(buffer.pos(), 19);
    }

    #[test]
    fn test_forward_and_self_pointers_are_rejected() {
        // pointer at offset 0 to offset 2
        let forward = [0xC0, 0x02, 0x00];
        assert!(matches!(
            decode_name(&forward, 0),
            Err(DnsError::MalformedPointer { offset: 0, .. })
        ));

        // pointer at offset 2 to itself
        let self_ref = [0x00, 0x00, 0xC0, 0x02];
        assert!(matches!(
            decode_name(&self_ref, 2),
            Err(DnsError::MalformedPointer { offset: 2, .. })
        ));
    }

    #[test]
    fn test_pointer_hop_limit() {
        // "a" at offset 0, then a chain where each pointer targets the previous one
        let mut data = vec![0x01, b'a', 0x00];
        let mut prev = 0u16;
        for _ in 0..11 {
            let here = data.len() as u16;
            data.extend_from_slice(&(0xC000 | prev).to_be_bytes());
            prev = here;
        }

        // ten hops is fine
        assert_eq!(decode_name(&data, 21).unwrap(), ("a".to_string(), 23));
        // eleven is not
        assert!(matches!(
            decode_name(&data, 23),
            Err(DnsError::MalformedPointer { .. })
        ));
    }

    #[test]
    fn test_reserved_label_type() {
        assert!(matches!(
            decode_name(&[0x40, 0x00], 0),
            Err(DnsError::MalformedPointer { .. })
        ));
        assert!(matches!(
            decode_name(&[0x80, 0x00], 0),
            Err(DnsError::MalformedPointer { .. })
        ));
    }

    #[test]
    fn test_truncated_names() {
        let bytes = encoded("example.com");
        for cut in 0..bytes.len() {
            assert!(
                matches!(
                    decode_name(&bytes[..cut], 0),
                    Err(DnsError::TruncatedMessage { .. })
                ),
                "prefix of {cut} bytes"
            );
        }

        // pointer missing its second byte
        assert!(matches!(
            decode_name(&[0x00, 0xC0], 1),
            Err(DnsError::TruncatedMessage { .. })
        ));
        // start past the end
        assert!(matches!(
            decode_name(&[0x00], 5),
            Err(DnsError::TruncatedMessage { .. })
        ));
    }

    #[test]
    fn test_fixed_width_reads() {
        let data = [0x12, 0x34, 0x00, 0x00, 0x01, 0x2C, 0xFF];
        let mut buffer = BytePacketBuffer::new(&data);
        assert_eq!(buffer.read_u16().unwrap(), 0x1234);
        assert_eq!(buffer.read_u32().unwrap(), 300);
        assert!(matches!(
            buffer.read_u16(),
            Err(DnsError::TruncatedMessage {
                offset: 6,
                needed: 2,
                len: 7
            })
        ));
        // a failed read leaves the cursor where it was
        assert_eq!(buffer.pos(), 6);
        assert_eq!(buffer.read().unwrap(), 0xFF);
        assert!(buffer.step(1).is_err());
        assert_eq!(buffer.len(), 7);
    }
}
