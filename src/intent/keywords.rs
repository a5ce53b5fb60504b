//! Bilingual keyword tables used by the intent cascade.
//!
//! Entries are stored already normalized (lowercase, Arabic alef/yaa/taa
//! marbuta folded, diacritics removed) so they compare directly against
//! [`super::Utterance`] text.

pub const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "good morning",
    "good evening",
    "مرحبا",
    "السلام عليكم",
    "اهلا",
    "هلا",
    "صباح الخير",
    "مساء الخير",
];

/// Abusive vocabulary that ends any conversation in progress.
pub const BANNED: &[&str] = &[
    "fuck",
    "shit",
    "bitch",
    "idiot",
    "stupid",
    "asshole",
    "غبي",
    "حمار",
    "كلب",
    "تفو",
    "وسخ",
    "حقير",
];

pub const LOCATION: &[&str] = &[
    "location",
    "address",
    "where are you",
    "where is the clinic",
    "directions",
    "map",
    "موقع",
    "عنوان",
    "وينكم",
    "وين العياده",
    "لوكيشن",
];

pub const OFFERS: &[&str] = &[
    "offer",
    "offers",
    "discount",
    "discounts",
    "promotion",
    "deal",
    "deals",
    "عرض",
    "عروض",
    "خصم",
    "خصومات",
    "تخفيض",
];

/// Accepted answers to the "do you want to see the offers?" prompt.
pub const OFFERS_CONFIRMATION: &[&str] = &[
    "yes",
    "yeah",
    "ok",
    "okay",
    "sure",
    "please",
    "show",
    "send",
    "نعم",
    "اي",
    "ايوه",
    "تمام",
    "اكيد",
    "اوك",
    "ابي",
    "ابغي",
    "ارسل",
];

pub const DOCTORS: &[&str] = &[
    "doctor",
    "doctors",
    "dentist",
    "dentists",
    "dr",
    "دكتور",
    "دكاتره",
    "طبيب",
    "اطباء",
    "دكتوره",
];

pub const CANCEL: &[&str] = &[
    "cancel",
    "cancellation",
    "الغاء",
    "الغي",
    "كنسل",
];

pub const BOOKING: &[&str] = &[
    "book",
    "booking",
    "appointment",
    "reserve",
    "reservation",
    "schedule",
    "حجز",
    "احجز",
    "موعد",
    "مواعيد",
];

/// Affirmative answers while a booking summary is awaiting confirmation.
pub const AFFIRMATIVE: &[&str] = &[
    "yes",
    "confirm",
    "ok",
    "okay",
    "sure",
    "نعم",
    "تاكيد",
    "اكد",
    "اكيد",
    "تمام",
    "موافق",
    "اي",
];

/// Negative answers while a booking summary is awaiting confirmation.
pub const NEGATIVE: &[&str] = &["no", "nope", "stop", "لا", "مو", "ما ابي"];
