//! Project name generation
//!
//! Names are `<adjective>-<noun>` drawn from small Spanish word lists.

use crate::BackendError;

const ADJECTIVES: &[&str] = &[
    "alegre", "amable", "audaz", "brillante", "callado", "claro", "dorado", "dulce", "feroz",
    "fresco", "gentil", "grande", "humilde", "libre", "lento", "nuevo", "oscuro", "rapido",
    "sereno", "sabio", "suave", "tranquilo", "valiente", "verde",
];

const NOUNS: &[&str] = &[
    "arbol", "barco", "bosque", "cielo", "colibri", "faro", "gato", "halcon", "isla", "jardin",
    "lago", "luna", "mar", "montana", "nube", "puente", "rio", "roble", "sendero", "sol",
    "tigre", "trueno", "valle", "viento",
];

/// Generate a random project name
pub fn generate_name() -> Result<String, BackendError> {
    let mut bytes = [0u8; 8];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| BackendError::Internal(format!("Failed to generate random bytes: {}", e)))?;

    let adjective = pick(ADJECTIVES, u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
    let noun = pick(NOUNS, u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]));
    Ok(format!("{}-{}", adjective, noun))
}

fn pick(words: &[&'static str], roll: u32) -> &'static str {
    words[roll as usize % words.len()]
}
