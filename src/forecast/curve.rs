//! Forecast curves and forecast nodes for downstream renderers.

use crate::domain::{FittedModel, ForecastCurve, ForecastNode, ThresholdPrediction, offset_date};
use crate::error::ForecastError;
use crate::models::predict;

/// Sample the fitted curve at every observation time, then every
/// `cadence_days` from the last observation up to (not including)
/// `days_ahead` days past it.
///
/// The projected segment starts at the last observation so it joins the
/// historical segment without a gap.
pub fn forecast_curve(model: &FittedModel, days_ahead: u32, cadence_days: u32) -> Result<ForecastCurve, ForecastError> {
    if cadence_days == 0 {
        return Err(ForecastError::invalid("cadence_days", "must be >= 1"));
    }

    let t_last = model.elapsed.iter().copied().fold(0.0_f64, f64::max);
    let horizon = t_last + f64::from(days_ahead);

    let mut times = model.elapsed.clone();
    let mut t = t_last;
    while t < horizon {
        times.push(t);
        t += f64::from(cadence_days);
    }

    let dates = times
        .iter()
        .map(|&t| offset_date(model.reference_date, t))
        .collect::<Result<Vec<_>, _>>()?;
    let predictions = times.iter().map(|&t| predict(t, &model.params)).collect();

    Ok(ForecastCurve {
        capability: model.capability.clone(),
        dates,
        predictions,
        historical_cutoff_index: model.elapsed.len(),
    })
}

/// Keep only successful, not-yet-achieved predictions as nodes (input order).
pub fn nodes_from_predictions<I>(predictions: I) -> Vec<ForecastNode>
where
    I: IntoIterator<Item = Result<ThresholdPrediction, ForecastError>>,
{
    predictions
        .into_iter()
        .filter_map(|p| match p {
            Ok(ThresholdPrediction::Forecast(f)) => Some(ForecastNode::from(&f)),
            _ => None,
        })
        .collect()
}
