//! Module interfaces
//!
//! Each cyclic module in `pole_exec` shall implement the `State` trait.

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// The module's internal state.
///
/// Modules are built from their parameters via a constructor, so there is no
/// separate initialisation step. Processing cannot fail: a module which has
/// nothing sensible to output falls back to a safe value and says so in its
/// status report.
pub trait State {
    /// Data required for cyclic processing.
    type InputData;
    /// Data produced by cyclic processing.
    type OutputData;
    /// A report on the status of the cyclic processing.
    type StatusReport;

    /// Main module processing function.
    ///
    /// # Inputs
    /// - `input_data`: The data required for processing by the module.
    ///
    /// # Outputs
    /// - A tuple of the output data and status report.
    fn proc(&mut self, input_data: &Self::InputData)
        -> (Self::OutputData, Self::StatusReport);

    /// Return the module to its power-on state.
    fn reset(&mut self);
}
