mod cli;

use std::fmt::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use dns_lookup::resolver::{Resolver, ResolverConfig};
use dns_lookup::structure::{DnsPacket, QueryParams};

fn render(packet: &DnsPacket, out: &mut impl Write) -> fmt::Result {
    let header = &packet.header;

    writeln!(out, "Transaction ID: {}", header.id)?;
    writeln!(out, "Flags: 0x{:04X}", header.flags())?;
    writeln!(out, "Questions: {}", header.qdcount)?;
    writeln!(out, "Answers: {}", header.anscount)?;
    writeln!(out, "Authority: {}", header.nscount)?;
    writeln!(out, "Additional: {}", header.arcount)?;

    for (i, record) in packet.answers.iter().enumerate() {
        writeln!(out, "Answer #{}:", i + 1)?;
        writeln!(out, "  Name: {}", record.domain)?;
        writeln!(out, "  Type: {}", record.qtype.to_num())?;
        writeln!(out, "  Class: {}", record.class)?;
        writeln!(out, "  TTL: {}", record.ttl)?;
        writeln!(out, "  Data length: {}", record.len)?;

        match record.ipv4() {
            Some(ip) => writeln!(out, "  IP address: {ip}")?,
            None => {
                let hex: Vec<String> = record.data.iter().map(|b| format!("{b:02X}")).collect();
                writeln!(out, "  Data: {}", hex.join(" "))?;
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level)).init();

    let params = if args.random_id {
        QueryParams::random()
    } else {
        QueryParams::default()
    };
    let resolver = Resolver::new(ResolverConfig {
        server: args.server,
        port: args.port,
        timeout: Duration::from_secs(args.timeout),
        ..ResolverConfig::default()
    });

    let packet = resolver
        .lookup(&args.domain, &params)
        .with_context(|| format!("DNS lookup for {} failed", args.domain))?;

    let mut text = String::new();
    render(&packet, &mut text)?;
    print!("{text}");

    Ok(())
}
