//! Parse host function imports out of an import-section dump.
//!
//! Example `wasm-objdump --details --section Import` output:
//! ```text
//! Import[2]:
//!  - func[0] sig=1 <bigIntGetUnsignedArgument> <- env.bigIntGetUnsignedArgument
//!  - func[3] sig=2 <env.getGasLeft> env.getGasLeft
//!  - memory[0] pages: initial=2 <- env.memory
//! ```

/// Namespace the host environment exports its functions under.
pub const HOST_NAMESPACE: &str = "env";

/// Keep only function imports from the host namespace, reduced to the
/// innermost dotted segment. Order and duplicates follow the dump.
pub fn parse_imports_text(text: &str) -> Vec<String> {
    let namespace = format!("{HOST_NAMESPACE}.");
    text.lines()
        .filter(|line| line.contains("func") && line.contains(&namespace))
        .filter_map(|line| line.trim_end().rsplit('.').next())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_objdump_format() {
        let text = "\
Import[3]:
 - func[0] sig=1 <bigIntGetUnsignedArgument> <- env.bigIntGetUnsignedArgument
 - func[3] sig=2 <env.getGasLeft> env.getGasLeft
 - memory[0] pages: initial=2 <- env.memory
";
        assert_eq!(
            parse_imports_text(text),
            vec!["bigIntGetUnsignedArgument", "getGasLeft"]
        );
    }

    #[test]
    fn test_duplicates_and_order_preserved() {
        let text = "\
 - func[1] sig=0 <b> <- env.b
 - func[2] sig=0 <a> <- env.a
 - func[3] sig=0 <b> <- env.b
";
        assert_eq!(parse_imports_text(text), vec!["b", "a", "b"]);
    }

    #[test]
    fn test_other_namespaces_ignored() {
        let text = " - func[0] sig=0 <fd_write> <- wasi_snapshot_preview1.fd_write\n";
        assert!(parse_imports_text(text).is_empty());
    }

    #[test]
    fn test_empty_dump() {
        assert!(parse_imports_text("").is_empty());
    }
}
