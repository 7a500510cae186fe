use libsonar_core::types::{DetectedType, TypeKind};

use super::lexer::{Token, TokenKind};

/// `I` followed by another uppercase letter, e.g. `IERC20`.
pub fn looks_like_interface(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('I') && chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Split an inheritance list at top-level commas, keeping the leading
/// identifier of each entry. `Ownable(msg.sender)` yields `Ownable`.
fn inheritance_list(tokens: &[&Token<'_>]) -> Vec<String> {
    let mut names = Vec::new();
    let mut depth = 0usize;
    let mut expecting = true;
    for token in tokens {
        match token.text {
            "(" => depth += 1,
            ")" => depth = depth.saturating_sub(1),
            "," if depth == 0 => expecting = true,
            _ if expecting && depth == 0 && token.kind == TokenKind::Ident => {
                names.push(token.text.to_string());
                expecting = false;
            }
            _ => {}
        }
    }
    names
}

/// Recognize `interface X`, `abstract contract X`, `library X` and
/// `contract X` declarations, each with an optional `is ...` list and a body.
pub fn scan_type_definitions(
    tokens: &[Token<'_>],
    path: &str,
    root_name: Option<&str>,
) -> Vec<DetectedType> {
    let code: Vec<&Token<'_>> = tokens.iter().filter(|t| t.code).collect();
    let mut types = Vec::new();

    let mut i = 0;
    while i < code.len() {
        let kind = match code[i].text {
            "interface" => TypeKind::Interface,
            "library" => TypeKind::Library,
            "contract" if i > 0 && code[i - 1].is_ident("abstract") => TypeKind::AbstractContract,
            "contract" => TypeKind::ContractImpl,
            _ => {
                i += 1;
                continue;
            }
        };
        if code[i].kind != TokenKind::Ident {
            i += 1;
            continue;
        }
        let name = match code.get(i + 1) {
            Some(t) if t.kind == TokenKind::Ident => t.text,
            _ => {
                i += 1;
                continue;
            }
        };
        // the header runs until the opening brace
        let body = match code[i + 2..]
            .iter()
            .position(|t| t.is_punct("{") || t.is_punct(";"))
        {
            Some(offset) if code[i + 2 + offset].is_punct("{") => i + 2 + offset,
            _ => {
                i += 2;
                continue;
            }
        };
        let header = &code[i + 2..body];
        let inherited = match header.first() {
            Some(t) if t.is_ident("is") => inheritance_list(&header[1..]),
            _ => vec![],
        };
        let (interfaces, parents): (Vec<String>, Vec<String>) = inherited
            .into_iter()
            .partition(|p| looks_like_interface(p));

        types.push(DetectedType {
            name: name.to_string(),
            kind,
            instanciable: kind == TypeKind::ContractImpl,
            is_root_contract_type: root_name == Some(name),
            parents,
            interfaces,
            libraries: vec![],
            source_path: path.to_string(),
        });
        i = body + 1;
    }

    let libraries = scan_using_directives(&code);
    if !libraries.is_empty() {
        for t in types.iter_mut().filter(|t| {
            matches!(t.kind, TypeKind::ContractImpl | TypeKind::AbstractContract)
        }) {
            t.libraries = libraries.clone();
        }
    }
    types
}

/// Libraries named in `using L for T;` anywhere in the file.
///
/// Attached to every concrete and abstract type of the file regardless of
/// which block the directive sits in.
fn scan_using_directives(code: &[&Token<'_>]) -> Vec<String> {
    let mut libraries = Vec::new();
    for (i, token) in code.iter().enumerate() {
        if !token.is_ident("using") {
            continue;
        }
        let library = match code.get(i + 1) {
            Some(t) if t.kind == TokenKind::Ident => t.text,
            _ => continue,
        };
        let has_for = code[i + 2..]
            .iter()
            .take_while(|t| !t.is_punct(";"))
            .any(|t| t.is_ident("for"));
        if has_for && !libraries.iter().any(|l| l == library) {
            libraries.push(library.to_string());
        }
    }
    libraries
}
