//! The source datasets a load run can (re)load.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
  contiguity::Contiguity,
  dispute::{Dispute, DisputeParticipant, MidLink, MidWarLink},
  record::Record,
  state::{MajorPower, MembershipInterval, State},
  war::{Belligerent, Participation, ParticipationSpell, War, WarSide},
  war3::{War3, War3Dates, War3Participant, War3ParticipantDates},
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Dataset {
  /// COW state list and major powers.
  CowStates,
  /// Gleditsch & Ward state list and microstates.
  KsgStates,
  /// COW War Data v4, all three war lists.
  War4,
  /// COW War Data v3.
  War3,
  /// Militarized Interstate Disputes.
  Mids,
  /// COW Direct Contiguity.
  Contdir,
}

impl Dataset {
  /// Tables owned exclusively by this dataset. States and memberships are
  /// shared between the two state lists and split by their `system` column.
  pub fn tables(self) -> &'static [&'static str] {
    match self {
      Self::CowStates => &[MajorPower::TABLE],
      Self::KsgStates => &[],
      Self::War4 => &[
        ParticipationSpell::TABLE,
        Participation::TABLE,
        Belligerent::TABLE,
        WarSide::TABLE,
        War::TABLE,
      ],
      Self::War3 => &[War3ParticipantDates::TABLE, War3Participant::TABLE, War3Dates::TABLE, War3::TABLE],
      Self::Mids => &[DisputeParticipant::TABLE, MidWarLink::TABLE, MidLink::TABLE, Dispute::TABLE],
      Self::Contdir => &[Contiguity::TABLE],
    }
  }

  /// True for the datasets whose rows feed the cross-system links.
  pub fn is_state_list(self) -> bool { matches!(self, Self::CowStates | Self::KsgStates) }

  /// Tables shared between state lists.
  pub const SHARED: &'static [&'static str] = &[State::TABLE, MembershipInterval::TABLE];
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn text_form_is_kebab_case() {
    assert_eq!(Dataset::CowStates.to_string(), "cow-states");
    assert_eq!("war4".parse::<Dataset>().unwrap(), Dataset::War4);
    assert_eq!(Dataset::iter().count(), 6);
  }

  #[test]
  fn no_table_belongs_to_two_datasets() {
    let mut all: Vec<_> = Dataset::iter().flat_map(|d| d.tables().iter().copied()).collect();
    let n = all.len();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), n);
  }
}
