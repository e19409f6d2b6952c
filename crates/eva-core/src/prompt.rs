//! Prompt annotations: structured text metadata attached to a point.
//!
//! A prompt is discriminated by its `location`. Tissue points carry a
//! multi-select status list; instrument points carry the instrument identity,
//! its ordering and a single status. The JSON shape is the flat object the
//! log format uses, e.g.
//!
//! ```text
//! {"location": "Tissue", "status": ["Clear View"]}
//! {"location": "Instrument", "instrument_order": 1, "point_order": 2,
//!  "instrument_name": "Clip", "status": "Self-occlusion"}
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Discriminator of a prompt annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Tissue,
    Instrument,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tissue => f.write_str("Tissue"),
            Self::Instrument => f.write_str("Instrument"),
        }
    }
}

/// Structured metadata for one point slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "location")]
pub enum PromptAnnotation {
    Tissue(TissuePrompt),
    Instrument(InstrumentPrompt),
}

/// Fields of a tissue prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TissuePrompt {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: Vec<StatusTag>,
}

/// Fields of an instrument prompt. Absent fields are omitted from the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentPrompt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_name: Option<InstrumentName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusTag>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<StatusTag>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<StatusTag>>::deserialize(deserializer)?.unwrap_or_default())
}

impl PromptAnnotation {
    /// Tissue prompt with the given statuses.
    pub fn tissue(status: impl IntoIterator<Item = StatusTag>) -> Self {
        Self::Tissue(TissuePrompt {
            status: status.into_iter().collect(),
        })
    }

    /// Fully specified instrument prompt.
    pub fn instrument(
        instrument_order: u32,
        point_order: u32,
        instrument_name: InstrumentName,
        status: StatusTag,
    ) -> Self {
        Self::Instrument(InstrumentPrompt {
            instrument_order: Some(instrument_order),
            point_order: Some(point_order),
            instrument_name: Some(instrument_name),
            status: Some(status),
        })
    }

    pub fn location(&self) -> Location {
        match self {
            Self::Tissue(_) => Location::Tissue,
            Self::Instrument(_) => Location::Instrument,
        }
    }

    /// Present fields other than `status`, in log order, with display values.
    ///
    /// This is the shape compared when reconciling a keyframe against the
    /// reference keyframe.
    pub fn shape_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("location", self.location().to_string())];
        if let Self::Instrument(p) = self {
            if let Some(order) = p.instrument_order {
                fields.push(("instrument_order", order.to_string()));
            }
            if let Some(order) = p.point_order {
                fields.push(("point_order", order.to_string()));
            }
            if let Some(name) = &p.instrument_name {
                fields.push(("instrument_name", name.to_string()));
            }
        }
        fields
    }

    /// Copy of `self` that carries `local`'s status.
    ///
    /// When the two prompts have different locations the status is converted:
    /// a tissue list keeps its first entry, an instrument status becomes a
    /// one-element list.
    pub fn with_status_of(&self, local: &PromptAnnotation) -> PromptAnnotation {
        match (self, local) {
            (Self::Tissue(_), Self::Tissue(local)) => Self::Tissue(TissuePrompt {
                status: local.status.clone(),
            }),
            (Self::Tissue(_), Self::Instrument(local)) => Self::Tissue(TissuePrompt {
                status: local.status.iter().cloned().collect(),
            }),
            (Self::Instrument(reference), Self::Instrument(local)) => {
                Self::Instrument(InstrumentPrompt {
                    status: local.status.clone(),
                    ..reference.clone()
                })
            }
            (Self::Instrument(reference), Self::Tissue(local)) => {
                Self::Instrument(InstrumentPrompt {
                    status: local.status.first().cloned(),
                    ..reference.clone()
                })
            }
        }
    }
}

macro_rules! string_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// A label outside the known vocabulary, kept verbatim.
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Other(s) => s.as_str(),
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $($label => Self::$variant,)+
                    other => Self::Other(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from(s.as_str())
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                v.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_vocabulary! {
    /// Visibility status of an annotated point on one keyframe.
    StatusTag {
        ClearView => "Clear View",
        Pulled => "Pulled",
        Reflection => "Reflection",
        SmokeObscuration => "Smoke Obscuration",
        InstrumentObscuration => "Instrument Obscuration",
        TissueObscuration => "Tissue Obscuration",
        OutOfView => "Out of view",
        SelfOcclusion => "Self-occlusion",
        EternalOcclusion => "Eternal Occlusion",
    }
}

string_vocabulary! {
    /// Surgical instrument an instrument point belongs to.
    InstrumentName {
        CadiereForceps => "Cadiere Forceps",
        FenestratedBipolarForceps => "Fenestrated Bipolar Forceps",
        NeedleDiver => "Needle Diver",
        ClipApplier => "Clip Applier",
        Clip => "Clip",
        TipUpFenestratedGrasper => "Tip-Up Fenestrated Grasper",
        HarmonicAceCurvedShears => "Harmonic Ace Curved Shears",
    }
}

impl StatusTag {
    /// Statuses offered for tissue points (multi-select).
    pub const TISSUE: [StatusTag; 7] = [
        StatusTag::ClearView,
        StatusTag::Pulled,
        StatusTag::Reflection,
        StatusTag::SmokeObscuration,
        StatusTag::InstrumentObscuration,
        StatusTag::TissueObscuration,
        StatusTag::OutOfView,
    ];

    /// Statuses offered for instrument points (single choice).
    pub const INSTRUMENT: [StatusTag; 4] = [
        StatusTag::ClearView,
        StatusTag::SelfOcclusion,
        StatusTag::EternalOcclusion,
        StatusTag::OutOfView,
    ];
}
