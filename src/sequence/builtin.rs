use crate::audio::score::AudioScore;
use crate::foundation::core::TimeMs;
use crate::narration::voice::VoiceSettings;
use crate::render::frame::Look;
use crate::scenes::{SceneEntry, SceneKind};
use crate::sequence::SequenceDef;
use crate::timeline::cue::{Cue, NarrationLine};

const SUBTITLES: [(u64, u64, &str); 9] = [
    (0, 8_000, "Night swallows the old house. The forest holds its breath."),
    (8_000, 16_000, "A window blinks with a light that should not exist."),
    (16_000, 22_000, "Something wakes."),
    (22_000, 30_000, "The hallway exhales dust. The oil lamp starves."),
    (30_000, 36_000, "The doll listens. The house remembers your name."),
    (36_000, 40_000, "Silence arrives like a closed mouth."),
    (40_000, 51_000, "Steps retreat, eyes adjust. The stairs descend by themselves."),
    (51_000, 54_000, "Something tall is waiting. It sees you first."),
    (54_000, 60_000, "There is no last step."),
];

const NARRATION: [(u64, &str); 9] = [
    (0, "रात ने पुराने घर को निगल लिया है। जंगल अपनी साँस रोके खड़ा है।"),
    (8_000, "एक खिड़की में ऐसी रोशनी टिमटिमाती है जो होनी ही नहीं चाहिए।"),
    (16_000, "कुछ जाग रहा है।"),
    (22_000, "गलियारा धूल छोड़ता है। तेल का दीया भूखा है।"),
    (30_000, "गुड़िया सुनती है। घर को तुम्हारा नाम याद है।"),
    (36_000, "ख़ामोशी एक बंद मुँह की तरह आती है।"),
    (40_000, "कदम पीछे हटते हैं, आँखें ढल जाती हैं। सीढ़ियाँ अपने आप नीचे उतरती हैं।"),
    (51_000, "कुछ लंबा इंतज़ार कर रहा है। वह तुम्हें पहले देखता है।"),
    (54_000, "कोई आख़िरी सीढ़ी नहीं है।"),
];

/// "The House That Remembers": three scenes over sixty seconds.
pub(crate) fn house_that_remembers() -> SequenceDef {
    SequenceDef {
        title: "The House That Remembers".to_string(),
        total: TimeMs(60_000),
        cutoff_lead: TimeMs(6_000),
        scenes: vec![
            SceneEntry::new(0, 20_000, SceneKind::ForestHouse),
            SceneEntry::new(20_000, 40_000, SceneKind::HallwayDoll),
            SceneEntry::new(40_000, 60_000, SceneKind::Stairwell).blank_on_cutoff(),
        ],
        subtitles: SUBTITLES
            .iter()
            .map(|&(start, end, text)| Cue::new(start, end, text.to_string()))
            .collect(),
        narration: NARRATION
            .iter()
            .map(|&(start, text)| NarrationLine {
                start: TimeMs(start),
                text: text.to_string(),
            })
            .collect(),
        voice: VoiceSettings::default(),
        audio: AudioScore::default(),
        look: Look::default(),
    }
}
