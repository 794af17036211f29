#![allow(clippy::upper_case_acronyms)]
use std::net::Ipv4Addr;

use crate::byte_packet_buffer::{encode_name, BytePacketBuffer};
use crate::error::{DnsError, Result};
use log::debug;

pub const HEADER_LEN: usize = 12;
pub const CLASS_IN: u16 = 1;
/// Standard query with recursion desired.
pub const QUERY_FLAGS: u16 = 0x0100;
pub const DEFAULT_QUERY_ID: u16 = 64;

/// only implementing a few common result codes, the entire list is here
/// https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-6
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResultCode {
    NOERROR,
    FORMERR,
    SERVFAIL,
    NXDOMAIN,
    NOTIMP,
    REFUSED,
    YXDOMAIN,
    XRRSET,
    NOTAUTH,
    NOTZONE,
    UNKNOWN(u8),
}

impl ResultCode {
    pub fn from_num(n: u8) -> Self {
        match n {
            0 => ResultCode::NOERROR,
            1 => ResultCode::FORMERR,
            2 => ResultCode::SERVFAIL,
            3 => ResultCode::NXDOMAIN,
            4 => ResultCode::NOTIMP,
            5 => ResultCode::REFUSED,
            6 => ResultCode::YXDOMAIN,
            7 => ResultCode::XRRSET,
            8 => ResultCode::NOTAUTH,
            9 => ResultCode::NOTZONE,
            n => ResultCode::UNKNOWN(n),
        }
    }

    pub fn to_num(self) -> u8 {
        match self {
            ResultCode::NOERROR => 0,
            ResultCode::FORMERR => 1,
            ResultCode::SERVFAIL => 2,
            ResultCode::NXDOMAIN => 3,
            ResultCode::NOTIMP => 4,
            ResultCode::REFUSED => 5,
            ResultCode::YXDOMAIN => 6,
            ResultCode::XRRSET => 7,
            ResultCode::NOTAUTH => 8,
            ResultCode::NOTZONE => 9,
            ResultCode::UNKNOWN(n) => n,
        }
    }
}

// header structure
// 86 2a 01 20 00 01 00 00 00 00 00 00
// 86 2a is the id, 01 20 the flags from query_res to rcode,
// then the four u16 section counts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16,
    pub query_res: bool,
    pub opcode: u8, // 4 bits, low nibble
    pub auth_ans: bool,
    pub trunc_msg: bool,
    pub rec_des: bool,
    pub rec_ava: bool,
    pub z: u8, // 3 bits
    pub rcode: ResultCode,
    pub qdcount: u16,
    pub anscount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl DnsHeader {
    pub fn from_flags(id: u16, flags: u16, qdcount: u16, anscount: u16, nscount: u16, arcount: u16) -> Self {
        // 0 0 0 0 0 0 0 1  0 0 1 0 0 0 0 0
        // - -+-+-+- - - -  - -+-+- -+-+-+-
        // Q    O    A T R  R   Z      R
        // R    P    A C D  A          C
        //      C                      O
        //      O                      D
        //      D                      E
        //      E
        let [a, b] = flags.to_be_bytes();

        Self {
            id,
            query_res: a & 0x80 != 0,
            opcode: (a & 0x78) >> 3,
            auth_ans: a & 0x04 != 0,
            trunc_msg: a & 0x02 != 0,
            rec_des: a & 0x01 != 0,
            rec_ava: b & 0x80 != 0,
            z: (b & 0x70) >> 4,
            rcode: ResultCode::from_num(b & 0x0F),
            qdcount,
            anscount,
            nscount,
            arcount,
        }
    }

    /// Packs the flag fields back into their 16-bit wire form.
    pub fn flags(&self) -> u16 {
        let a = (self.query_res as u8) << 7
            | (self.opcode & 0x0F) << 3
            | (self.auth_ans as u8) << 2
            | (self.trunc_msg as u8) << 1
            | self.rec_des as u8;
        let b = (self.rec_ava as u8) << 7 | (self.z & 0x07) << 4 | (self.rcode.to_num() & 0x0F);

        u16::from_be_bytes([a, b])
    }

    pub fn read(buf: &mut BytePacketBuffer) -> Result<Self> {
        let id = buf.read_u16()?;
        let flags = buf.read_u16()?;
        let qdcount = buf.read_u16()?;
        let anscount = buf.read_u16()?;
        let nscount = buf.read_u16()?;
        let arcount = buf.read_u16()?;

        Ok(Self::from_flags(id, flags, qdcount, anscount, nscount, arcount))
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&encode_header(
            self.id,
            self.flags(),
            self.qdcount,
            self.anscount,
            self.nscount,
            self.arcount,
        ));
    }
}

pub fn encode_header(id: u16, flags: u16, qdcount: u16, anscount: u16, nscount: u16, arcount: u16) -> [u8; HEADER_LEN] {
    let mut out = [0u8; HEADER_LEN];
    for (i, field) in [id, flags, qdcount, anscount, nscount, arcount].into_iter().enumerate() {
        out[i * 2..i * 2 + 2].copy_from_slice(&field.to_be_bytes());
    }
    out
}

pub fn decode_header(bytes: &[u8]) -> Result<DnsHeader> {
    DnsHeader::read(&mut BytePacketBuffer::new(bytes))
}

#[derive(PartialEq, Eq, Debug, Clone, Hash, Copy)]
pub enum QueryType {
    UNKNOWN(u16),
    A,
}

impl QueryType {
    pub fn from_num(num: u16) -> QueryType {
        match num {
            1 => QueryType::A,
            _ => QueryType::UNKNOWN(num),
        }
    }

    pub fn to_num(self) -> u16 {
        match self {
            QueryType::A => 1,
            QueryType::UNKNOWN(num) => num,
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub struct DnsQuestion {
    pub name: String,
    pub qtype: QueryType,
    pub class: u16,
}

impl DnsQuestion {
    pub fn new(name: &str, qtype: QueryType, class: u16) -> Self {
        Self {
            name: name.to_string(),
            qtype,
            class,
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        encode_name(&self.name, out)?;
        out.extend_from_slice(&self.qtype.to_num().to_be_bytes());
        out.extend_from_slice(&self.class.to_be_bytes());

        Ok(())
    }

    /// Moves the cursor past one question without keeping its contents.
    pub fn skip(buffer: &mut BytePacketBuffer) -> Result<()> {
        buffer.read_qname()?;
        buffer.step(4) // qtype + qclass
    }
}

pub fn encode_question(domain: &str, qtype: QueryType, class: u16) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    DnsQuestion::new(domain, qtype, class).write(&mut out)?;
    Ok(out)
}

#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub struct DnsRecord {
    pub domain: String,
    pub qtype: QueryType,
    pub class: u16,
    pub ttl: u32,
    pub len: u16,
    pub data: Vec<u8>,
}

impl DnsRecord {
    pub fn read(buf: &mut BytePacketBuffer) -> Result<Self> {
        let domain = buf.read_qname()?;

        let qtype = QueryType::from_num(buf.read_u16()?);
        let class = buf.read_u16()?;
        let ttl = buf.read_u32()?;
        let len = buf.read_u16()?;
        let data = buf.read_range(len as usize)?.to_vec();

        Ok(Self {
            domain,
            qtype,
            class,
            ttl,
            len,
            data,
        })
    }

    /// The address carried by an A/IN record, if this is one.
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        match (self.qtype, self.class, self.data.as_slice()) {
            (QueryType::A, CLASS_IN, &[a, b, c, d]) => Some(Ipv4Addr::new(a, b, c, d)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryParams {
    pub id: u16,
    pub qtype: QueryType,
    pub class: u16,
}

impl QueryParams {
    /// Default parameters with a random transaction id.
    pub fn random() -> Self {
        Self {
            id: rand::random::<u16>(),
            ..Self::default()
        }
    }
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            id: DEFAULT_QUERY_ID,
            qtype: QueryType::A,
            class: CLASS_IN,
        }
    }
}

pub fn build_query(domain: &str, params: &QueryParams) -> Result<Vec<u8>> {
    let header = DnsHeader::from_flags(params.id, QUERY_FLAGS, 1, 0, 0, 0);
    let question = DnsQuestion::new(domain, params.qtype, params.class);

    let mut out = Vec::with_capacity(HEADER_LEN + domain.len() + 6);
    header.write(&mut out);
    question.write(&mut out)?;

    Ok(out)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DnsPacket {
    pub header: DnsHeader,
    pub answers: Vec<DnsRecord>,
}

impl DnsPacket {
    /// Parses a response: header, then the question section is skipped, then
    /// `anscount` answer records. Authority and additional sections are left alone.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(DnsError::TruncatedMessage {
                offset: 0,
                needed: HEADER_LEN,
                len: bytes.len(),
            });
        }

        let mut buf = BytePacketBuffer::new(bytes);
        let header = DnsHeader::read(&mut buf)?;

        for _ in 0..header.qdcount {
            DnsQuestion::skip(&mut buf)?;
        }

        let mut answers = Vec::with_capacity(header.anscount.into());
        for _ in 0..header.anscount {
            answers.push(DnsRecord::read(&mut buf)?);
        }

        debug!(
            "parsed response id={} rcode={:?} answers={} ({} of {} bytes consumed)",
            header.id,
            header.rcode,
            answers.len(),
            buf.pos(),
            buf.len()
        );

        Ok(Self { header, answers })
    }
}
