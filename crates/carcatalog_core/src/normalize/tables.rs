//! Static Japanese/English maker and model translation tables.
//!
//! Lookups are case-insensitive and treat unknown keys as "no translation".
//! Table order matters for model replacement: longer tokens that contain a
//! shorter one (`ランサーエボリューション` / `ランサー`) come first.

/// `(japanese, english)` maker names.
pub const MAKER_TRANSLATIONS: &[(&str, &str)] = &[
    ("トヨタ", "Toyota"),
    ("ホンダ", "Honda"),
    ("日産", "Nissan"),
    ("マツダ", "Mazda"),
    ("スバル", "Subaru"),
    ("スズキ", "Suzuki"),
    ("ダイハツ", "Daihatsu"),
    ("三菱", "Mitsubishi"),
    ("いすゞ", "Isuzu"),
    ("日野", "Hino"),
    ("光岡", "Mitsuoka"),
    ("メルセデス", "Mercedes"),
    ("BMW", "BMW"),
    ("アウディ", "Audi"),
    ("フォルクスワーゲン", "Volkswagen"),
    ("フォード", "Ford"),
    ("レクサス", "Lexus"),
    ("インフィニティ", "Infiniti"),
    ("アキュラ", "Acura"),
    ("スマート", "Smart"),
    ("ミニ", "Mini"),
];

/// `(japanese, english)` model names.
pub const MODEL_TRANSLATIONS: &[(&str, &str)] = &[
    ("カローラ", "Corolla"),
    ("プリウス", "Prius"),
    ("ヴィッツ", "Vitz"),
    ("ハイラックス", "Hilux"),
    ("ランドクルーザー", "Land Cruiser"),
    ("ハリアー", "Harrier"),
    ("RAV4", "RAV4"),
    ("シビック", "Civic"),
    ("フィット", "Fit"),
    ("CR-V", "CR-V"),
    ("NSX", "NSX"),
    ("S2000", "S2000"),
    ("GT-R", "GT-R"),
    ("フェアレディZ", "Fairlady Z"),
    ("スカイライン", "Skyline"),
    ("マーチ", "March"),
    ("エルグランド", "Elgrand"),
    ("RX-7", "RX-7"),
    ("RX-8", "RX-8"),
    ("MX-5", "MX-5"),
    ("ロードスター", "Roadster"),
    ("インプレッサ", "Impreza"),
    ("レガシィ", "Legacy"),
    ("フォレスター", "Forester"),
    ("WRX", "WRX"),
    ("スイフト", "Swift"),
    ("ワゴンR", "Wagon R"),
    ("ジムニー", "Jimny"),
    ("ミラ", "Mira"),
    ("タント", "Tanto"),
    ("エブリイ", "Every"),
    ("ランサーエボリューション", "Lancer Evolution"),
    ("ランサー", "Lancer"),
    ("アウトランダー", "Outlander"),
    ("デリカ", "Delica"),
    ("エルフ", "Elf"),
    ("ギガ", "Giga"),
    ("プロフィア", "Profia"),
    ("オロチ", "Orochi"),
    ("ヒメラ", "Himera"),
    ("ロッキー", "Rocky"),
    ("コペン", "Copen"),
];

/// Every known maker spelling, Japanese and English.
pub fn all_maker_spellings() -> impl Iterator<Item = &'static str> {
    MAKER_TRANSLATIONS
        .iter()
        .map(|(ja, _)| *ja)
        .chain(MAKER_TRANSLATIONS.iter().map(|(_, en)| *en))
}

/// English maker for a Japanese spelling.
pub fn english_maker(name: &str) -> Option<&'static str> {
    lookup(MAKER_TRANSLATIONS, name, Side::Japanese)
}

/// Japanese maker for an English spelling.
pub fn japanese_maker(name: &str) -> Option<&'static str> {
    lookup(MAKER_TRANSLATIONS, name, Side::English)
}

/// English model for a Japanese spelling.
pub fn english_model(name: &str) -> Option<&'static str> {
    lookup(MODEL_TRANSLATIONS, name, Side::Japanese)
}

/// Japanese model for an English spelling.
pub fn japanese_model(name: &str) -> Option<&'static str> {
    lookup(MODEL_TRANSLATIONS, name, Side::English)
}

#[derive(Clone, Copy)]
enum Side {
    Japanese,
    English,
}

fn lookup(
    table: &'static [(&'static str, &'static str)],
    name: &str,
    side: Side,
) -> Option<&'static str> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    table.iter().find_map(|(ja, en)| {
        let (key, value) = match side {
            Side::Japanese => (ja, en),
            Side::English => (en, ja),
        };
        (key.to_lowercase() == needle).then_some(*value)
    })
}
