#[cfg(feature = "core")]
#[doc(inline)]
pub use avtad_core as core;

#[cfg(feature = "snip")]
#[doc(inline)]
pub use avtad_snip as snip;

#[cfg(feature = "rescale")]
#[doc(inline)]
pub use avtad_rescale as rescale;

#[cfg(feature = "io")]
#[doc(inline)]
pub use avtad_io as io;
