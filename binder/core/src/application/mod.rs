// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod compliance_enforcer;
pub mod registry;
pub mod report;
pub mod synthesis;

pub use compliance_enforcer::{ComplianceEnforcer, EnforcementOutcome};
pub use registry::BinderRegistry;
pub use report::{SynthesisFailure, SynthesisReport};
pub use synthesis::{SynthesisDriver, SynthesisError, SynthesisOptions};
