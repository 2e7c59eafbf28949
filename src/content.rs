//! Static statement bank the rounds are drawn from.
//!
//! Ids are unique across both partitions and opaque: players see them
//! before results, so nothing in an id hints at the partition. Round 1 only
//! draws from the curated shortlists below; later rounds may use the whole
//! pool.

use crate::types::{LocalizedText, Sentence};
use std::sync::LazyLock;

/// (id, en, he, ar)
type Row = (&'static str, &'static str, &'static str, &'static str);

/// Fake statements eligible for round 1
pub const ROUND1_FAKE_IDS: &[&str] = &[
    "s-30", "s-09", "s-27", "s-07", "s-29", "s-14", "s-21", "s-23",
];

/// True statements eligible for round 1
pub const ROUND1_TRUE_IDS: &[&str] = &["s-01", "s-34", "s-22", "s-18", "s-02", "s-10"];

const FALSE_ROWS: &[Row] = &[
    (
        "s-30",
        "The Great Wall of China is visible from space.",
        "החומה הגדולה של סין נראית מהחלל.",
        "يمكن رؤية سور الصين العظيم من الفضاء.",
    ),
    (
        "s-09",
        "Bats are completely blind.",
        "עטלפים עיוורים לחלוטין.",
        "الخفافيش عمياء تمامًا.",
    ),
    (
        "s-27",
        "Humans use only 10% of their brain.",
        "בני אדם משתמשים רק ב-10% מהמוח שלהם.",
        "البشر يستخدمون 10% فقط من أدمغتهم.",
    ),
    (
        "s-07",
        "Goldfish have a 3-second memory.",
        "לדגי זהב יש זיכרון של 3 שניות.",
        "أسماك الزينة لديها ذاكرة لمدة 3 ثوانٍ.",
    ),
    (
        "s-06",
        "Sugar makes kids hyperactive.",
        "סוכר גורם לילדים להיות היפראקטיביים.",
        "السكر يجعل الأطفال مفرطين في النشاط.",
    ),
    (
        "s-29",
        "Lightning never strikes the same place twice.",
        "ברקים לעולם לא פוגעים באותו מקום פעמיים.",
        "البرق لا يضرب نفس المكان مرتين أبدًا.",
    ),
    (
        "s-35",
        "Shaving makes hair grow thicker.",
        "גילוח גורם לשיער לגדול עבה יותר.",
        "الحلاقة تجعل الشعر ينمو بشكل أكثر سماكة.",
    ),
    (
        "s-14",
        "Bananas grow on trees.",
        "בננות גדלות על עצים.",
        "الموز ينمو على الأشجار.",
    ),
    (
        "s-37",
        "Chameleons change color only to hide.",
        "זיקיות משנות צבע רק כדי להסתתר.",
        "الحرباء تغير لونها فقط للاختباء.",
    ),
    (
        "s-21",
        "Bulls hate the color red.",
        "שוורים שונאים את הצבע האדום.",
        "الثيران تكره اللون الأحمر.",
    ),
    (
        "s-04",
        "Rain only falls from clouds.",
        "גשם יורד רק מעננים.",
        "المطر يسقط فقط من الغيوم.",
    ),
    (
        "s-25",
        "The pyramids were built by slaves.",
        "הפירמידות נבנו על ידי עבדים.",
        "تم بناء الأهرامات بواسطة العبيد.",
    ),
    (
        "s-28",
        "Chili heat kills bacteria.",
        "חום הצ'ילי הורג חיידקים.",
        "حرارة الفلفل الحار تقتل البكتيريا.",
    ),
    (
        "s-11",
        "Fish never sleep.",
        "דגים לעולם לא ישנים.",
        "الأسماك لا تنام أبدًا.",
    ),
    (
        "s-20",
        "Hyenas are always female.",
        "צבועים הם תמיד נקבות.",
        "الضباع دائمًا إناث.",
    ),
    (
        "s-15",
        "Carrots super-boost eyesight.",
        "גזרים משפרים מאוד את הראייה.",
        "الجزر يعزز الرؤية بشكل كبير.",
    ),
    (
        "s-40",
        "Touching baby birds leads parents to abandon them.",
        "מגע עם גוזלים גורם להורים לנטוש אותם.",
        "لمس الطيور الصغيرة يؤدي إلى تخلي الوالدين عنها.",
    ),
    (
        "s-31",
        "You must drink exactly 8 cups of water daily.",
        "אתה חייב לשתות בדיוק 8 כוסות מים מדי יום.",
        "يجب شرب 8 أكواب من الماء يوميًا بالضبط.",
    ),
    (
        "s-13",
        "Blood is blue inside the body.",
        "הדם כחול בתוך הגוף.",
        "الدم أزرق داخل الجسم.",
    ),
    (
        "s-23",
        "Chewing gum stays in your stomach for 7 years.",
        "מסטיק נשאר בקיבה שלך למשך 7 שנים.",
        "تبقى العلكة في معدتك لمدة 7 سنوات.",
    ),
];

const TRUE_ROWS: &[Row] = &[
    (
        "s-01",
        "Honey never spoils.",
        "דבש לעולם לא מתקלקל.",
        "العسل لا يفسد أبدًا.",
    ),
    (
        "s-34",
        "Octopuses have three hearts.",
        "לתמנונים יש שלושה לבבות.",
        "الأخطبوطات لديها ثلاثة قلوب.",
    ),
    (
        "s-22",
        "Penguins have knees.",
        "לפינגווינים יש ברכיים.",
        "البطاريق لديها ركب.",
    ),
    (
        "s-05",
        "Shaving does not make hair grow thicker.",
        "גילוח לא גורם לשיער לגדול עבה יותר.",
        "الحلاقة لا تجعل الشعر ينمو بشكل أكثر سماكة.",
    ),
    (
        "s-18",
        "Peanuts are legumes, not nuts.",
        "בוטנים הם קטניות, לא אגוזים.",
        "الفول السوداني هو بقوليات وليس مكسرات.",
    ),
    (
        "s-02",
        "Camels store fat, not water.",
        "גמלים מאחסנים שומן, לא מים.",
        "الإبل تخزن الدهون وليس الماء.",
    ),
    (
        "s-16",
        "Bananas grow on a giant herb, not a tree.",
        "בננות גדלות על עשב ענק, לא על עץ.",
        "الموز ينمو على عشب عملاق وليس على شجرة.",
    ),
    (
        "s-10",
        "Elephants can swim.",
        "פילים יכולים לשחות.",
        "الفيلة يمكنها السباحة.",
    ),
    (
        "s-24",
        "Humans share 50% of their DNA with bananas.",
        "בני אדם חולקים 50% מה-DNA שלהם עם בננות.",
        "البشر يتشاركون 50% من الحمض النووي مع الموز.",
    ),
    (
        "s-39",
        "Sleeping less than 6 hours increases risk of early death.",
        "שינה של פחות מ-6 שעות מגבירה את הסיכון למוות מוקדם.",
        "النوم أقل من 6 ساعات يزيد من خطر الوفاة المبكرة.",
    ),
    (
        "s-26",
        "Cows have best friends.",
        "לפרות יש חברים טובים ביותר.",
        "الأبقار لديها أفضل الأصدقاء.",
    ),
    (
        "s-38",
        "Coffee reduces the risk of depression.",
        "קפה מפחית את הסיכון לדיכאון.",
        "القهوة تقلل من خطر الاكتئاب.",
    ),
    (
        "s-32",
        "Giraffes have the same number of neck bones as humans.",
        "לג'ירפות יש אותו מספר חוליות צוואר כמו לבני אדם.",
        "الزرافات لديها نفس عدد عظام الرقبة مثل البشر.",
    ),
    (
        "s-12",
        "Summer is not caused by being closer to the sun.",
        "קיץ לא נגרם מלהיות קרוב יותר לשמש.",
        "الصيف لا يحدث بسبب القرب من الشمس.",
    ),
    (
        "s-19",
        "Fever can sometimes be beneficial.",
        "חום יכול לפעמים להיות מועיל.",
        "الحمى يمكن أن تكون مفيدة أحيانًا.",
    ),
    (
        "s-36",
        "Birds are not the only egg-layers.",
        "ציפורים אינן היחידות שמטילות ביצים.",
        "الطيور ليست الوحيدة التي تضع البيض.",
    ),
    (
        "s-33",
        "Plants can \"hear\" vibrations.",
        "צמחים יכולים \"לשמוע\" תנודות.",
        "يمكن للنباتات \"سماع\" الاهتزازات.",
    ),
    (
        "s-17",
        "Babies are born with 300 bones.",
        "תינוקות נולדים עם 300 עצמות.",
        "يولد الأطفال بـ 300 عظمة.",
    ),
    (
        "s-03",
        "Human body temperature is not always 37°C.",
        "טמפרטורת הגוף האנושית אינה תמיד 37°C.",
        "درجة حرارة الجسم البشري ليست دائمًا 37°C.",
    ),
    (
        "s-08",
        "The moon reflects sunlight and does not shine on its own.",
        "הירח משקף אור שמש ולא זוהר מעצמו.",
        "القمر يعكس ضوء الشمس ولا يضيء من تلقاء نفسه.",
    ),
];

static FALSE_STATEMENTS: LazyLock<Vec<Sentence>> = LazyLock::new(|| build(FALSE_ROWS, true));
static TRUE_STATEMENTS: LazyLock<Vec<Sentence>> = LazyLock::new(|| build(TRUE_ROWS, false));

fn build(rows: &[Row], is_fake: bool) -> Vec<Sentence> {
    rows.iter()
        .map(|(id, en, he, ar)| Sentence {
            id: id.to_string(),
            text: LocalizedText {
                en: en.to_string(),
                he: he.to_string(),
                ar: ar.to_string(),
            },
            is_fake,
        })
        .collect()
}

pub fn false_statements() -> &'static [Sentence] {
    &FALSE_STATEMENTS
}

pub fn true_statements() -> &'static [Sentence] {
    &TRUE_STATEMENTS
}

/// Look up a statement by id in either partition
pub fn sentence_by_id(id: &str) -> Option<&'static Sentence> {
    false_statements()
        .iter()
        .chain(true_statements())
        .find(|s| s.id == id)
}

/// Statements of one partition whose ids are in `ids`, in `ids` order
pub fn shortlist(ids: &[&str], is_fake: bool) -> Vec<Sentence> {
    ids.iter()
        .filter_map(|id| sentence_by_id(id))
        .filter(|s| s.is_fake == is_fake)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_unique_across_partitions() {
        let ids: HashSet<_> = false_statements()
            .iter()
            .chain(true_statements())
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids.len(), false_statements().len() + true_statements().len());
    }

    #[test]
    fn test_partitions_carry_ground_truth() {
        assert!(false_statements().iter().all(|s| s.is_fake));
        assert!(true_statements().iter().all(|s| !s.is_fake));
    }

    #[test]
    fn test_round1_shortlists_resolve() {
        assert_eq!(shortlist(ROUND1_FAKE_IDS, true).len(), ROUND1_FAKE_IDS.len());
        assert_eq!(shortlist(ROUND1_TRUE_IDS, false).len(), ROUND1_TRUE_IDS.len());
    }

    #[test]
    fn test_every_statement_is_translated() {
        for s in false_statements().iter().chain(true_statements()) {
            assert!(!s.text.en.is_empty(), "{} missing en", s.id);
            assert!(!s.text.he.is_empty(), "{} missing he", s.id);
            assert!(!s.text.ar.is_empty(), "{} missing ar", s.id);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(
            sentence_by_id("s-34").map(|s| s.text.en.as_str()),
            Some("Octopuses have three hearts.")
        );
        assert!(sentence_by_id("s-99").is_none());
    }
}
