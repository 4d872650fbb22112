//! Record identity assignment

use uuid::Uuid;

use crate::model::RecordKind;

/// Fixed namespace for row-derived identifiers
const ROW_NAMESPACE: Uuid = Uuid::from_u128(0x5a4a_7f1e_93c2_4d6b_8e21_0c4f_a9b3_d170);

/// How decoded records receive their `id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityMode {
    /// UUIDv5 of the record kind and source row; stable across reloads
    #[default]
    RowDerived,
    /// Fresh v4 UUID on every decode
    Random,
}

impl IdentityMode {
    pub fn assign(&self, kind: RecordKind, row_index: u32) -> String {
        match self {
            Self::RowDerived => {
                let name = format!("{}:{}", kind, row_index);
                Uuid::new_v5(&ROW_NAMESPACE, name.as_bytes()).to_string()
            }
            Self::Random => Uuid::new_v4().to_string(),
        }
    }
}
