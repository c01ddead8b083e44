// Entities taking part in NAS signalling at the MME
#[derive(PartialEq, Eq, Hash, Clone, Debug, Copy)]
pub enum NasEntity {
    /// S1AP transport towards the eNodeB
    S1ap,
    /// NAS procedure engine (EMM/ESM)
    Mme,
    /// GTP-C towards the serving gateway
    Gtpc,
    /// Subscriber database
    Hss,
}

impl core::fmt::Display for NasEntity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NasEntity::S1ap => write!(f, "S1AP"),
            NasEntity::Mme => write!(f, "MME"),
            NasEntity::Gtpc => write!(f, "GTP-C"),
            NasEntity::Hss => write!(f, "HSS"),
        }
    }
}
