use libsonar_core::types::Address;

use super::{
    addresses::{address_literal, collect},
    lexer::{Token, TokenKind},
};

/// How many tokens after a trigger may hold the address.
const WINDOW: usize = 6;

const UPGRADE_CALLS: [&str; 2] = ["upgradeto", "upgradetoandcall"];

/// Identifiers that introduce a candidate implementation address: anything
/// naming an implementation or a beacon, `impl`, and the upgrade entry points.
fn is_trigger(token: &Token<'_>) -> bool {
    if token.kind != TokenKind::Ident {
        return false;
    }
    let lower = token.text.to_ascii_lowercase();
    let bare = lower.trim_start_matches('_');
    lower.contains("implementation")
        || lower.contains("beacon")
        || lower.ends_with("impl")
        || UPGRADE_CALLS.contains(&bare)
}

fn is_stop(token: &Token<'_>) -> bool {
    token.kind == TokenKind::Punct
        && matches!(token.text, ";" | "==" | "!=" | "{" | "}")
}

/// Addresses that source text declares as proxy implementations.
///
/// Matches the first address literal shortly after a trigger, e.g.
/// `implementation = 0x..`, `upgradeTo(0x..)`, `// Implementation: 0x..` or
/// `beacon = address(0x..)`. This is a candidate heuristic and errs on the
/// side of matching.
pub fn scan_declared_implementations(
    tokens: &[Token<'_>],
    own: Address,
    cap: usize,
) -> Vec<Address> {
    let mut found = Vec::new();
    for (i, trigger) in tokens.iter().enumerate() {
        if found.len() >= cap {
            break;
        }
        if !is_trigger(trigger) {
            continue;
        }
        let candidate = tokens[i + 1..]
            .iter()
            .take(WINDOW)
            .take_while(|t| t.code == trigger.code && !is_stop(t))
            .find_map(address_literal);
        if let Some(address) = candidate {
            collect(&mut found, address, own, cap);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::lexer::tokenize;

    const OWN: Address = Address::repeat_byte(0x42);

    fn scan(text: &str) -> Vec<Address> {
        scan_declared_implementations(&tokenize(text), OWN, 20)
    }

    #[test]
    fn test_assignment_and_calls() {
        let text = r#"
            address public implementation = 0x1111111111111111111111111111111111111111;
            function boot() external {
                _mint(0x9999999999999999999999999999999999999999);
                upgradeToAndCall(0x2222222222222222222222222222222222222222, "");
                beacon = address(0x3333333333333333333333333333333333333333);
            }
        "#;
        assert_eq!(
            scan(text),
            vec![
                Address::repeat_byte(0x11),
                Address::repeat_byte(0x22),
                Address::repeat_byte(0x33),
            ]
        );
    }

    #[test]
    fn test_comment_mentions() {
        let text = "// IMPLEMENTATION: 0x4444444444444444444444444444444444444444\ncontract P {}";
        assert_eq!(scan(text), vec![Address::repeat_byte(0x44)]);
    }

    #[test]
    fn test_stops_at_statement_end_and_comparisons() {
        let text = r#"
            address impl;
            address other = 0x5555555555555555555555555555555555555555;
            require(implementation == 0x6666666666666666666666666666666666666666);
        "#;
        assert!(scan(text).is_empty());
    }

    #[test]
    fn test_excludes_own_and_sentinels() {
        let text = r#"
            implementation = 0x4242424242424242424242424242424242424242;
            _setImplementation(0x0000000000000000000000000000000000000000);
            impl = 0x7777777777777777777777777777777777777777;
            logicImpl = 0x7777777777777777777777777777777777777777;
        "#;
        assert_eq!(scan(text), vec![Address::repeat_byte(0x77)]);
    }
}
