/// Units which are simply type aliases for `f32` rather than having an
/// implementation as a `uom` `Quantity`.
///
/// These are used in the innermost loops of the tracking methods, where the
/// values are fed straight into `nalgebra` and trigonometry, but we still want
/// some clues in the source as to what they represent.

pub type Lengthf32    = f32;
pub type Anglef32     = f32;
pub type Amplitudef32 = f32; // FOD amplitude: not a physical quantity
