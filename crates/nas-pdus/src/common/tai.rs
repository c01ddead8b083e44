use core::fmt;

use nas_core::{BitBuffer, DecodeError, EncodeError};

use super::plmn::PlmnId;


/// TS 24.301 9.9.3.32 Tracking area identity, value part.
/// Length: 5 octets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackingAreaId {
    pub plmn: PlmnId,
    pub tac: u16,
}

impl TrackingAreaId {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let plmn = PlmnId::from_bitbuf(buffer)?;
        let tac = buffer.read_field(16, "tac")? as u16;
        Ok(TrackingAreaId { plmn, tac })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        self.plmn.to_bitbuf(buffer)?;
        buffer.write_bits(self.tac as u64, 16);
        Ok(())
    }
}

impl fmt::Display for TrackingAreaId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.plmn, self.tac)
    }
}

/// One partial tracking area identity list (type of list 0, 1 or 2)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialTaiList {
    /// Type 0: non-consecutive TACs within one PLMN
    NonConsecutive { plmn: PlmnId, tacs: Vec<u16> },
    /// Type 1: `count` consecutive TACs starting at `first_tac`
    Consecutive { plmn: PlmnId, first_tac: u16, count: u8 },
    /// Type 2: TAIs from possibly different PLMNs
    Tais(Vec<TrackingAreaId>),
}

impl PartialTaiList {
    fn num_elements(&self) -> usize {
        match self {
            PartialTaiList::NonConsecutive { tacs, .. } => tacs.len(),
            PartialTaiList::Consecutive { count, .. } => *count as usize,
            PartialTaiList::Tais(tais) => tais.len(),
        }
    }
}

/// TS 24.301 9.9.3.33 Tracking area identity list, value part.
/// Length: 6..96 octets, at most 16 TAIs in total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaiList {
    pub lists: Vec<PartialTaiList>,
}

impl TaiList {
    pub const MAX_TAIS: usize = 16;
    pub const MAX_LEN: usize = 96;

    /// Single-entry list holding just `tai`
    pub fn single(tai: TrackingAreaId) -> Self {
        TaiList { lists: vec![PartialTaiList::NonConsecutive { plmn: tai.plmn, tacs: vec![tai.tac] }] }
    }

    pub fn contains(&self, tai: &TrackingAreaId) -> bool {
        self.lists.iter().any(|l| match l {
            PartialTaiList::NonConsecutive { plmn, tacs } => *plmn == tai.plmn && tacs.contains(&tai.tac),
            PartialTaiList::Consecutive { plmn, first_tac, count } => {
                *plmn == tai.plmn && tai.tac >= *first_tac && (tai.tac as u32) < *first_tac as u32 + *count as u32
            }
            PartialTaiList::Tais(tais) => tais.contains(tai),
        })
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let mut lists = Vec::new();
        let mut total = 0usize;

        while buffer.get_len_remaining() > 0 {
            buffer.read_field(1, "spare")?;
            let list_type = buffer.read_field(2, "type_of_list")?;
            let count = buffer.read_field(5, "number_of_elements")? as usize + 1;
            total += count;
            if total > Self::MAX_TAIS {
                return Err(DecodeError::TooManyElements { field: "tai_list", max: Self::MAX_TAIS, found: total });
            }

            let partial = match list_type {
                0 => {
                    let plmn = PlmnId::from_bitbuf(buffer)?;
                    let mut tacs = Vec::with_capacity(count);
                    for _ in 0..count {
                        tacs.push(buffer.read_field(16, "tac")? as u16);
                    }
                    PartialTaiList::NonConsecutive { plmn, tacs }
                }
                1 => {
                    let plmn = PlmnId::from_bitbuf(buffer)?;
                    let first_tac = buffer.read_field(16, "tac")? as u16;
                    PartialTaiList::Consecutive { plmn, first_tac, count: count as u8 }
                }
                2 => {
                    let mut tais = Vec::with_capacity(count);
                    for _ in 0..count {
                        tais.push(TrackingAreaId::from_bitbuf(buffer)?);
                    }
                    PartialTaiList::Tais(tais)
                }
                other => return Err(DecodeError::InvalidEnumValue { field: "type_of_list", value: other }),
            };
            lists.push(partial);
        }

        if lists.is_empty() {
            return Err(DecodeError::MissingMandatoryIe { field: "partial_tai_list" });
        }
        Ok(TaiList { lists })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        let total: usize = self.lists.iter().map(|l| l.num_elements()).sum();
        if total > Self::MAX_TAIS {
            return Err(EncodeError::TooManyElements { field: "tai_list", max: Self::MAX_TAIS, found: total });
        }
        if self.lists.is_empty() {
            return Err(EncodeError::MissingField { field: "partial_tai_list" });
        }

        for list in &self.lists {
            let n = list.num_elements();
            if n == 0 {
                return Err(EncodeError::MissingField { field: "tai_list_element" });
            }
            let list_type = match list {
                PartialTaiList::NonConsecutive { .. } => 0,
                PartialTaiList::Consecutive { .. } => 1,
                PartialTaiList::Tais(_) => 2,
            };
            buffer.write_bits(0, 1);
            buffer.write_bits(list_type, 2);
            buffer.write_bits(n as u64 - 1, 5);
            match list {
                PartialTaiList::NonConsecutive { plmn, tacs } => {
                    plmn.to_bitbuf(buffer)?;
                    for tac in tacs {
                        buffer.write_bits(*tac as u64, 16);
                    }
                }
                PartialTaiList::Consecutive { plmn, first_tac, .. } => {
                    plmn.to_bitbuf(buffer)?;
                    buffer.write_bits(*first_tac as u64, 16);
                }
                PartialTaiList::Tais(tais) => {
                    for tai in tais {
                        tai.to_bitbuf(buffer)?;
                    }
                }
            }
        }
        Ok(())
    }
}
