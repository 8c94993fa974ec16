//! Line-oriented text form of a [`DecodeTable`].
//!
//! ```text
//! insn <id> <symbol> label=.. trace=.. pattern=.. handler=.. fast=.. hint=.. latency=..
//!      power=.. macro=0|1 resource=.. tags=a,b isa_tags=.. args=arg;arg
//! forest <name> width=<bits> groups=<n> root=<symbol>
//! group <symbol> key=<bits|-|catch-all> test=<first>:<width> known=<pattern> children=<s,s>
//! leaf <symbol> key=<bits|-|catch-all> insn=<id> catchall=0|1
//! tag <name> <leaf symbol>...
//! ```
//!
//! Empty optional fields and empty lists render as `-`.

use std::fmt;
use std::io;

use sha2::{Digest, Sha256};

use super::table::{DecodeTable, ForestEntry, InsnEntry, NodeEntry, TagEntry};

fn flag(value: bool) -> u8 {
    u8::from(value)
}

fn list(items: &[String], separator: &str) -> String {
    if items.is_empty() {
        "-".to_owned()
    } else {
        items.join(separator)
    }
}

impl fmt::Display for InsnEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insn {} {} label={} trace={} pattern={} handler={} fast={} hint={} latency={} power={} macro={} resource={} tags={} isa_tags={} args={}",
            self.id,
            self.symbol,
            self.label,
            self.trace_label,
            self.pattern,
            self.handler,
            self.fast_handler,
            self.decode_hint.as_deref().unwrap_or("-"),
            self.latency,
            self.power_group,
            flag(self.is_macro_op),
            self.resource.as_deref().unwrap_or("-"),
            list(&self.tags, ","),
            list(&self.isa_tags, ","),
            list(&self.arguments, ";"),
        )
    }
}

impl fmt::Display for NodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeEntry::Group {
                symbol,
                key,
                test,
                known,
                children,
            } => write!(
                f,
                "group {symbol} key={key} test={test} known={known} children={}",
                list(children, ",")
            ),
            NodeEntry::Leaf {
                symbol,
                key,
                insn,
                catchall,
            } => write!(
                f,
                "leaf {symbol} key={key} insn={insn} catchall={}",
                flag(*catchall)
            ),
        }
    }
}

impl fmt::Display for ForestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "forest {} width={} groups={} root={}",
            self.name, self.width, self.groups, self.root
        )?;
        for node in &self.nodes {
            writeln!(f, "{node}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TagEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag {}", self.tag)?;
        for leaf in &self.leaves {
            write!(f, " {leaf}")?;
        }
        Ok(())
    }
}

impl fmt::Display for DecodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for insn in &self.instructions {
            writeln!(f, "{insn}")?;
        }
        for forest in &self.forests {
            write!(f, "{forest}")?;
        }
        for tag in &self.tags {
            writeln!(f, "{tag}")?;
        }
        Ok(())
    }
}

impl DecodeTable {
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// SHA-256 of the rendered artifact.
    pub fn fingerprint(&self) -> [u8; 32] {
        let digest = Sha256::digest(self.render().as_bytes());
        let mut array = [0u8; 32];
        array.copy_from_slice(&digest);
        array
    }

    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint())
    }

    pub fn write_to<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.render().as_bytes())?;
        writer.flush()
    }
}
