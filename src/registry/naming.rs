// Collection name -> unit type identifier
//
// The rule: split on '_', upper-case the first character of every segment,
// concatenate. Upper-casing is ASCII-only; a segment starting with any other
// character keeps it unchanged. Empty segments contribute nothing.
//
//     servers          -> Servers
//     key_pairs        -> KeyPairs
//     security_groups_ -> SecurityGroups

/// Derive the type identifier a collection's model unit must declare
pub fn unit_type_name(collection: &str) -> String {
    if !collection.is_ascii() {
        tracing::warn!(
            "Collection name {:?} contains non-ASCII characters; only ASCII letters are capitalized",
            collection
        );
    }

    let mut name = String::with_capacity(collection.len());
    for segment in collection.split('_') {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            name.push(first.to_ascii_uppercase());
            name.push_str(chars.as_str());
        }
    }
    name
}
