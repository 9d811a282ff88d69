use tokio::sync::watch;

/// Commands sent from a [`crate::binding::BindingHandle`] to the worker that owns the binding.
#[derive(Debug)]
pub enum BindingCommand {
    // ****************************************
    // ** Source / lifecycle
    /// Display another identifier. An empty identifier clears the surface
    SetSource { source: String },
    /// Stop all work and end the worker
    Close,

    // ****************************************
    // ** Host notifications
    /// Set visibility directly
    SetVisible { visible: bool },
    /// Surface was mapped
    Map,
    /// Surface was unmapped
    Unmap,
    /// Follow the focus flag of a top-level, `None` unbinds
    BindFocusScope { scope: Option<watch::Receiver<bool>> },
    /// Push the top-level focus directly
    SetFocused { focused: bool },
    /// Allocation or scale factor changed
    GeometryChanged,

    // ****************************************
    // ** Animation control
    StartAnimation,
    StopAnimation,
}
