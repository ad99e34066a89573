use crate::error::SolveError;
use crate::model::SolveModel;

/// Best-case capacity figures for one scenario. Working capacity assumes
/// every interviewer takes only the required minimum of breaks.
#[derive(Debug, Clone, Copy)]
pub struct CapacitySummary {
    pub capacity: u64,
    pub demand: u64,
    pub virtual_capacity: u64,
    pub virtual_demand: u64,
}

pub fn summarize(model: &SolveModel) -> CapacitySummary {
    let working = model.quotas.working_slots() as u64;
    CapacitySummary {
        capacity: (model.num_interviewers() as u64).saturating_mul(working),
        demand: model.demand(),
        virtual_capacity: (model.virtual_count() as u64).saturating_mul(working),
        virtual_demand: (model.num_students() as u64)
            .saturating_mul(model.quotas.min_virtual as u64),
    }
}

/// Arithmetic feasibility precheck, run before any search. Necessary but not
/// sufficient: a pass does not guarantee a schedule exists.
pub fn precheck(summary: &CapacitySummary) -> Result<(), SolveError> {
    if summary.demand > summary.capacity {
        return Err(SolveError::InfeasibleDemand {
            demand: summary.demand,
            capacity: summary.capacity,
        });
    }
    if summary.virtual_demand > summary.virtual_capacity {
        return Err(SolveError::InfeasibleVirtualDemand {
            virtual_demand: summary.virtual_demand,
            virtual_capacity: summary.virtual_capacity,
        });
    }
    Ok(())
}
