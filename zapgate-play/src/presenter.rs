use zapgate_core::QrRaster;

/// Content of the payment panel's image slot: either a freshly encoded
/// QR raster or one of the two static completion badges.
#[derive(Debug, Clone)]
pub enum SlotImage {
    Qr(QrRaster),
    Paid,
    Withdrawn,
}

impl SlotImage {
    pub fn is_badge(&self) -> bool {
        !matches!(self, SlotImage::Qr(_))
    }
}

/// Projection of a session onto the three observable panel slots.
///
/// Setters only; implementations own whatever display surface backs the
/// slots and handle their own interior mutability. A raster written into
/// the image slot replaces the previous one, which is released.
pub trait Presenter: Send + Sync {
    fn set_panel_visible(&self, visible: bool);

    fn set_caption(&self, caption: &str);

    fn set_image(&self, image: SlotImage);
}

/// Presenter for headless hosts; drops every update.
#[derive(Debug, Default, Clone)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn set_panel_visible(&self, _visible: bool) {}

    fn set_caption(&self, _caption: &str) {}

    fn set_image(&self, _image: SlotImage) {}
}
