use crate::app::App;
use crate::config::UiSettings;
use crate::mpris::MprisHandle;

pub fn update_mpris(mpris: &MprisHandle, app: &App, ui: &UiSettings) {
    mpris.sync(&app.playback, &ui.reciter_fallback);
}
