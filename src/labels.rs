// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Endpoint label keys carrying Designate identity across reconciliation cycles.
//!
//! Every endpoint returned by the record listing carries all three labels. External-dns
//! hands them back on the next change batch, which lets the reconciler address the exact
//! record set it read instead of searching for it again.

/// ID of the Designate record set the endpoint was read from
pub const LABEL_RECORD_SET_ID: &str = "designate-recordset-id";

/// ID of the Designate zone owning the record set
pub const LABEL_ZONE_ID: &str = "designate-zone-id";

/// All values of the record set as observed on the last read, joined by
/// [`ORIGINAL_RECORDS_SEPARATOR`](crate::constants::ORIGINAL_RECORDS_SEPARATOR).
///
/// Needed so that values not mentioned by a change batch survive when a record set
/// holds several targets and only some of them change.
pub const LABEL_ORIGINAL_RECORDS: &str = "designate-original-records";
