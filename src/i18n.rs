//! Translation lookup for the few strings the server itself produces
//! (category labels, status names, error messages).

use crate::types::{GameStatus, Language};

/// key -> [en, he, ar]
const TRANSLATIONS: &[(&str, [&str; 3])] = &[
    ("app.title", ["Fake News Seminar", "סמינר פייק ניוז", "ندوة الأخبار المزيفة"]),
    ("category.victim", ["Victim", "קורבן", "ضحية"]),
    ("category.truthExplorer", ["Truth Explorer", "חוקר אמת", "مستكشف الحقيقة"]),
    ("category.lieInvestigator", ["Lie Investigator", "חוקר שקרים", "محقق الأكاذيب"]),
    ("category.lieHunter", ["Lie Hunter", "צייד שקרים", "صياد الأكاذيب"]),
    ("status.lobby", ["Waiting for game to start...", "ממתין למשחק להתחיל...", "في انتظار بدء اللعبة..."]),
    ("status.round1", ["Round 1", "סיבוב 1", "الجولة 1"]),
    ("status.round2", ["Round 2", "סיבוב 2", "الجولة 2"]),
    ("status.round3", ["Round 3", "סיבוב 3", "الجولة 3"]),
    ("status.results", ["Final Results", "תוצאות סופיות", "النتائج النهائية"]),
    ("error.gameNotFound", ["Game not found", "המשחק לא נמצא", "اللعبة غير موجودة"]),
    ("error.joinClosed", ["The game has already started", "המשחק כבר התחיל", "لقد بدأت اللعبة بالفعل"]),
    ("error.unauthorized", ["Admin privileges required", "נדרשות הרשאות מנהל", "مطلوب صلاحيات المدير"]),
    ("error.noPlayers", ["Waiting for players to join", "ממתין לשחקנים", "في انتظار انضمام اللاعبين"]),
    ("error.playerNotFound", ["You are no longer in this game", "אינך משתתף עוד במשחק זה", "لم تعد في هذه اللعبة"]),
    ("error.generic", ["Something went wrong, please try again", "משהו השתבש, נסו שוב", "حدث خطأ ما، يرجى المحاولة مرة أخرى"]),
];

/// Look up `key` in `lang`; unknown keys come back unchanged
pub fn translate(key: &str, lang: Language) -> &str {
    let idx = match lang {
        Language::En => 0,
        Language::He => 1,
        Language::Ar => 2,
    };
    TRANSLATIONS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, texts)| texts[idx])
        .unwrap_or(key)
}

pub fn status_label(status: GameStatus, lang: Language) -> &'static str {
    let key = match status {
        GameStatus::Lobby => "status.lobby",
        GameStatus::Round1 => "status.round1",
        GameStatus::Round2 => "status.round2",
        GameStatus::Round3 => "status.round3",
        GameStatus::Results => "status.results",
    };
    translate(key, lang)
}
