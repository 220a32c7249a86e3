//! IRIs of the reserved service namespace.

use oxrdf::NamedNodeRef;

pub const BASE: &str = "http://www.orbql.example/";

pub const INPUT: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://www.orbql.example/input");
pub const OUTPUT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.orbql.example/output");
pub const AUTHOR: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.orbql.example/author");
pub const DESCRIPTION: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.orbql.example/description");
pub const PROVENANCE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.orbql.example/provenance");
pub const VERSION: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.orbql.example/version");
pub const ORB: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://www.orbql.example/orb");
pub const ORB_DESCRIPTION: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.orbql.example/orb_description");

/// The four description predicates, in the order self-description triples are emitted.
pub const DESCRIPTION_PREDICATES: [NamedNodeRef<'_>; 4] =
    [AUTHOR, DESCRIPTION, PROVENANCE, VERSION];
