//! Wire request/response types for the LST API.
//!
//! These are hand-written serde structs (with utoipa schemas for the
//! OpenAPI document) plus the translation helpers between wire values and
//! the core's domain types. Timestamps travel as RFC 3339 strings and
//! dates as `YYYY-MM-DD`; enums travel as their kebab-case labels.

use chrono::{DateTime, Utc};
use lst_core::analytics::{DateRange, TimeSeriesPoint};
use lst_core::{
    FacilityId, FacilityRef, PcrRound, Program, SenderDetails, SpecimenDraft, SpecimenKind,
    SpecimenRecord, SubjectDetails, TrackerError, TrackerResult,
};
use lst_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /{program}/specimens`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSpecimenReq {
    pub facility_name: String,
    pub district: Option<String>,
    pub sender_name: Option<String>,
    pub sender_phone: Option<String>,
    pub subject_name: String,
    pub barcode: Option<String>,
    pub maternal_id: Option<String>,
    pub patient_id: Option<String>,
    /// "dbs-card" or "plasma-tube".
    pub kind: String,
    /// EID only: "first", "second", "third" or "non-routine".
    pub pcr_round: Option<String>,
}

impl CreateSpecimenReq {
    /// Translate the wire request into the core's batch-allocation inputs.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty facility or subject name, or an
    /// unrecognised kind/PCR-round label.
    pub fn into_parts(
        self,
        facility_id: FacilityId,
    ) -> TrackerResult<(FacilityRef, SenderDetails, SpecimenDraft)> {
        let facility = FacilityRef {
            id: facility_id,
            name: NonEmptyText::new(&self.facility_name)
                .map_err(|_| TrackerError::InvalidInput("facility name is required".into()))?,
            district: self.district,
        };
        let sender = SenderDetails {
            name: self.sender_name,
            phone: self.sender_phone,
        };
        let draft = SpecimenDraft {
            subject: SubjectDetails {
                name: NonEmptyText::new(&self.subject_name)
                    .map_err(|_| TrackerError::InvalidInput("subject name is required".into()))?,
                barcode: self.barcode,
                maternal_id: self.maternal_id,
                patient_id: self.patient_id,
            },
            kind: self.kind.parse::<SpecimenKind>()?,
            pcr_round: self
                .pcr_round
                .as_deref()
                .map(str::parse::<PcrRound>)
                .transpose()?,
            created_at: None,
        };
        Ok((facility, sender, draft))
    }
}

/// Body of `POST /{program}/specimens/:id/collect`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CollectReq {
    /// RFC 3339 collection timestamp; defaults to now.
    pub collected_at: Option<String>,
    /// Replacement barcode, when the card was re-labelled.
    pub barcode: Option<String>,
}

impl CollectReq {
    /// Parse the optional timestamp.
    pub fn collected_at(&self) -> TrackerResult<Option<DateTime<Utc>>> {
        self.collected_at
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|err| {
                        TrackerError::InvalidInput(format!("invalid collected_at: {err}"))
                    })
            })
            .transpose()
    }
}

/// Body of `POST /{program}/packages`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PackageSpecimensReq {
    pub package: String,
    pub specimens: Vec<Uuid>,
}

/// Query parameters of the listing endpoints.
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
pub struct ListParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Derived-stage label, matched case-insensitively.
    pub status: Option<String>,
    /// Substring over subject name and identifiers.
    pub search: Option<String>,
    /// Package label filter (packaged listing only).
    pub package: Option<String>,
}

/// Query parameters of the time-series endpoint.
#[derive(Clone, Debug, Deserialize, IntoParams)]
pub struct TimeSeriesParams {
    /// Range in days, or "all".
    pub range: String,
}

/// Parse a `range` query value into a [`DateRange`].
pub fn parse_range(raw: &str) -> TrackerResult<DateRange> {
    if raw.eq_ignore_ascii_case("all") {
        return Ok(DateRange::AllTime);
    }
    raw.parse::<u32>()
        .map(DateRange::Days)
        .map_err(|_| TrackerError::InvalidInput(format!("invalid range \"{raw}\"")))
}

// ============================================================================
// Responses
// ============================================================================

/// A specimen as rendered to the presentation layer, with its derived
/// stage.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SpecimenDto {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub position: u16,
    pub subject_name: String,
    pub barcode: Option<String>,
    pub maternal_id: Option<String>,
    pub patient_id: Option<String>,
    pub kind: String,
    pub pcr_round: Option<String>,
    pub stage: String,
    pub result: Option<String>,
    pub package: Option<String>,
    pub created_at: String,
    pub collected_at: Option<String>,
    pub received_at: Option<String>,
    pub tested_at: Option<String>,
    pub verified_at: Option<String>,
}

impl SpecimenDto {
    pub fn from_record(program: Program, record: &SpecimenRecord) -> Self {
        let rfc3339 = |at: DateTime<Utc>| at.to_rfc3339();
        Self {
            id: record.id.as_uuid(),
            batch_id: record.batch_id.as_uuid(),
            position: record.position.get(),
            subject_name: record.subject.name.as_str().to_owned(),
            barcode: record.subject.barcode.clone(),
            maternal_id: record.subject.maternal_id.clone(),
            patient_id: record.subject.patient_id.clone(),
            kind: record.kind.as_str().to_owned(),
            pcr_round: record.pcr_round.map(|r| r.as_str().to_owned()),
            stage: lst_core::stage_label(program, record).to_owned(),
            result: record.result.map(|r| r.as_str().to_owned()),
            package: record.package_label.as_ref().map(|l| l.as_str().to_owned()),
            created_at: rfc3339(record.created_at),
            collected_at: record.collected_at.map(rfc3339),
            received_at: record.received_at.map(rfc3339),
            tested_at: record.tested_at.map(rfc3339),
            verified_at: record.verified_at.map(rfc3339),
        }
    }
}

/// Response of `POST /{program}/specimens`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSpecimenRes {
    pub specimen_id: Uuid,
    pub batch_id: Uuid,
    pub position: u16,
}

/// Response of `POST /{program}/specimens/:id/collect`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CollectRes {
    pub specimen_id: Uuid,
    pub collected_at: String,
}

/// Generic acknowledgement body.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct OkRes {
    pub ok: bool,
    pub message: String,
}

/// Response of the specimen and ready-for-packaging listings.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListSpecimensRes {
    pub items: Vec<SpecimenDto>,
    pub total: usize,
}

/// Response of `POST /{program}/packages`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PackageSpecimensRes {
    pub ok: bool,
    pub message: String,
    pub package: String,
    pub specimen_count: usize,
}

/// Response of the packaged listing, with the known labels for filter
/// population.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PackagedListRes {
    pub items: Vec<SpecimenDto>,
    pub total: usize,
    pub packages: Vec<String>,
}

/// One dashboard bucket.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TimeSeriesPointDto {
    /// Bucket label date, `YYYY-MM-DD`.
    pub date: String,
    pub pending_count: usize,
    pub collected_count: usize,
}

impl From<TimeSeriesPoint> for TimeSeriesPointDto {
    fn from(point: TimeSeriesPoint) -> Self {
        Self {
            date: point.date.format("%Y-%m-%d").to_string(),
            pending_count: point.pending_count,
            collected_count: point.collected_count,
        }
    }
}

/// Response of the time-series endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TimeSeriesRes {
    pub points: Vec<TimeSeriesPointDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_req() -> CreateSpecimenReq {
        CreateSpecimenReq {
            facility_name: "Lirangwe Health Centre".into(),
            district: Some("Blantyre".into()),
            sender_name: None,
            sender_phone: None,
            subject_name: "Baby Nyirenda".into(),
            barcode: Some("DBS-500".into()),
            maternal_id: Some("MAT-9".into()),
            patient_id: None,
            kind: "dbs-card".into(),
            pcr_round: Some("first".into()),
        }
    }

    #[test]
    fn create_request_translates_to_domain_types() {
        let (facility, _sender, draft) = create_req()
            .into_parts(FacilityId::random())
            .expect("translate");
        assert_eq!(facility.name.as_str(), "Lirangwe Health Centre");
        assert_eq!(draft.kind, SpecimenKind::DbsCard);
        assert_eq!(draft.pcr_round, Some(PcrRound::First));
    }

    #[test]
    fn create_request_rejects_blank_names_and_bad_labels() {
        let mut req = create_req();
        req.subject_name = "   ".into();
        assert!(req.into_parts(FacilityId::random()).is_err());

        let mut req = create_req();
        req.kind = "urine".into();
        assert!(req.into_parts(FacilityId::random()).is_err());
    }

    #[test]
    fn collect_request_parses_rfc3339() {
        let req = CollectReq {
            collected_at: Some("2026-02-14T09:30:00Z".into()),
            barcode: None,
        };
        let at = req.collected_at().expect("parse").expect("present");
        assert_eq!(at.to_rfc3339(), "2026-02-14T09:30:00+00:00");

        let bad = CollectReq {
            collected_at: Some("last tuesday".into()),
            barcode: None,
        };
        assert!(bad.collected_at().is_err());
    }

    #[test]
    fn range_accepts_days_and_all() {
        assert_eq!(parse_range("30").expect("days"), DateRange::Days(30));
        assert_eq!(parse_range("ALL").expect("all"), DateRange::AllTime);
        assert!(parse_range("forever").is_err());
    }
}
