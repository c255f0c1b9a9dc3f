// MIT License - Copyright (c) 2026 bolid-bridge developers

//! Protocol constants and static hardware catalogs.
//!
//! Device model names and bus event descriptions are kept exactly as the
//! vendor documents them (in Russian); everything the library itself says
//! is English.

/// CRC8 lookup table used by every frame on the bus.
///
/// Note: this is the table the hardware actually uses. It deviates from the
/// textbook Dallas/Maxim table at index 249, so it must not be regenerated
/// from the polynomial.
pub const CRC8_TABLE: [u8; 256] = [
    0, 94, 188, 226, 97, 63, 221, 131, 194, 156,
    126, 32, 163, 253, 31, 65, 157, 195, 33, 127,
    252, 162, 64, 30, 95, 1, 227, 189, 62, 96,
    130, 220, 35, 125, 159, 193, 66, 28, 254, 160,
    225, 191, 93, 3, 128, 222, 60, 98, 190, 224,
    2, 92, 223, 129, 99, 61, 124, 34, 192, 158,
    29, 67, 161, 255, 70, 24, 250, 164, 39, 121,
    155, 197, 132, 218, 56, 102, 229, 187, 89, 7,
    219, 133, 103, 57, 186, 228, 6, 88, 25, 71,
    165, 251, 120, 38, 196, 154, 101, 59, 217, 135,
    4, 90, 184, 230, 167, 249, 27, 69, 198, 152,
    122, 36, 248, 166, 68, 26, 153, 199, 37, 123,
    58, 100, 134, 216, 91, 5, 231, 185, 140, 210,
    48, 110, 237, 179, 81, 15, 78, 16, 242, 172,
    47, 113, 147, 205, 17, 79, 173, 243, 112, 46,
    204, 146, 211, 141, 111, 49, 178, 236, 14, 80,
    175, 241, 19, 77, 206, 144, 114, 44, 109, 51,
    209, 143, 12, 82, 176, 238, 50, 108, 142, 208,
    83, 13, 239, 177, 240, 174, 76, 18, 145, 207,
    45, 115, 202, 148, 118, 40, 171, 245, 23, 73,
    8, 86, 180, 234, 105, 55, 213, 139, 87, 9,
    235, 181, 54, 104, 138, 212, 149, 203, 41, 119,
    244, 170, 72, 22, 233, 183, 85, 11, 136, 214,
    52, 106, 43, 117, 151, 201, 74, 20, 246, 168,
    116, 42, 200, 150, 21, 75, 169, 247, 182, 252,
    10, 84, 215, 137, 107, 53,
];

/// Resolve a device type code to its model name.
///
/// Returns `None` for codes absent from the catalog; callers render those
/// with [`device_display_name`].
pub fn device_name(code: u8) -> Option<&'static str> {
    match code {
        0 => Some("С2000/С2000М"),
        1 => Some("Сигнал-20"),
        2 => Some("Сигнал-20П"),
        3 => Some("С2000-СП1"),
        4 => Some("С2000-4"),
        7 => Some("С2000-К"),
        8 => Some("С2000-ИТ"),
        9 => Some("С2000-КДЛ"),
        10 => Some("С2000-БИ/БКИ"),
        11 => Some("Сигнал-20(вер. 02)"),
        13 => Some("С2000-КС"),
        14 => Some("С2000-АСПТ"),
        15 => Some("С2000-КПБ"),
        16 => Some("С2000-2"),
        19 => Some("УО-ОРИОН"),
        20 => Some("Рупор"),
        21 => Some("Рупор-Диспетчер исп.01"),
        22 => Some("С2000-ПТ"),
        24 => Some("УО-4С"),
        25 => Some("Поток-3Н"),
        26 => Some("Сигнал-20М"),
        28 => Some("С2000-БИ-01"),
        30 => Some("Рупор исп.01"),
        31 => Some("С2000-Adem"),
        32 | 34 => Some("Сигнал-10"),
        33 => Some("РИП-12 исп.50, исп.51, без исполнения"),
        36 => Some("С2000-ПП"),
        38 => Some("РИП-12 исп.54"),
        39 => Some("РИП-24 исп.50, исп.51"),
        41 => Some("С2000-КДЛ-2И"),
        43 => Some("С2000-PGE"),
        44 => Some("С2000-БКИ"),
        45 => Some("Поток-БКИ"),
        46 => Some("Рупор-200"),
        47 => Some("С2000-Периметр"),
        48 => Some("МИП-12"),
        49 => Some("МИП-24"),
        53 => Some("РИП-48 исп.01"),
        54 => Some("РИП-12 исп.56"),
        55 => Some("РИП-24 исп.56"),
        59 => Some("Рупор исп.02"),
        61 => Some("С2000-КДЛ-Modbus"),
        66 => Some("Рупор исп.03"),
        67 => Some("Рупор-300"),
        76 => Some("С2000-PGE исп.01"),
        79 => Some("ПКВ-РИП-12 исп.56"),
        80 => Some("ПКВ-РИП-24 исп.56"),
        81 => Some("С2000-КДЛ-2И исп.01"),
        82 => Some("ШКП-RS"),
        _ => None,
    }
}

/// Catalog name for a device type code, with a placeholder for unknown codes.
pub fn device_display_name(code: u8) -> String {
    match device_name(code) {
        Some(name) => name.to_string(),
        None => format!("Unknown device type {code}"),
    }
}

/// Description of a relay control program (codes 0..=57).
pub fn relay_program_description(program: u8) -> Option<&'static str> {
    match program {
        0 => Some("Не управлять"),
        1 => Some("Включить"),
        2 => Some("Выключить"),
        3 => Some("Включить на время"),
        4 => Some("Выключить на время"),
        5 => Some("Мигать из состояния выключено"),
        6 => Some("Мигать из состояния включено"),
        7 => Some("Мигать из состояния выключено на время"),
        8 => Some("Мигать из состояния включено на время"),
        9 => Some("Лампа"),
        10 => Some("ПЦН"),
        11 => Some("АСПТ"),
        12 => Some("Сирена"),
        13 => Some("Пожарный ПЦН"),
        14 => Some("Выход неисправность"),
        15 => Some("Пожарная лампа"),
        16 => Some("Старая тактика ПЦН"),
        17 => Some("Включить на время перед взятием"),
        18 => Some("Выключить на время перед взятием"),
        19 => Some("Включить на время при взятии"),
        20 => Some("Выключить на время при взятии"),
        21 => Some("Включить на время при снятии"),
        22 => Some("Выключить на время при снятии"),
        23 => Some("Включить на время при невзятии"),
        24 => Some("Выключить на время при невзятии"),
        25 => Some("Включить на время при нарушении технологического ШС"),
        26 => Some("Выключить на время при нарушении технологического ШС"),
        27 => Some("Включить при снятии"),
        28 => Some("Выключить при снятии (выход взят-снят)"),
        29 => Some("Включить при взятии"),
        30 => Some("Выключить при взятии"),
        31 => Some("Включить при нарушении технологического ШС"),
        32 => Some("Выключить при нарушении технологического ШС"),
        33 => Some("АСПТ-1"),
        34 => Some("АСПТ-А"),
        35 => Some("АСПТ-А1"),
        36 => Some("Включить при повышении температуры"),
        37 => Some("Включить при понижении температуры"),
        38 => Some("Включить при задержке пуска"),
        39 => Some("Включить при пуске ПТ"),
        40 => Some("Включить при тушении"),
        41 => Some("Включить при неудачном пуске"),
        42 => Some("Включить при включении автоматики"),
        43 => Some("Выключить при включении автоматики"),
        44 => Some("Включить при выключении автоматики"),
        45 => Some("Выключить при выключении автоматики"),
        46 => Some("Включить если ИУ в рабочем состоянии"),
        47 => Some("Выключить если ИУ в рабочем состоянии"),
        48 => Some("Включить если ИУ в исходном состоянии"),
        49 => Some("Выключить если ИУ в исходном состоянии"),
        50 => Some("Включить при Пожар2"),
        51 => Some("Выключить при Пожар2"),
        52 => Some("Мигать при Пожар2 из состояния выключено"),
        53 => Some("Мигать при Пожар2 из состояния включено"),
        54 => Some("Включить при нападении"),
        55 => Some("Выключить при нападении"),
        56 => Some("Лампа 2"),
        57 => Some("Сирена 2"),
        _ => None,
    }
}

/// Description of a branch (loop) event/state code as reported on the bus.
pub fn branch_state_description(code: u8) -> Option<&'static str> {
    match code {
        1 => Some("Восстановление сети 220 В"),
        2 => Some("Авария сети 220 В"),
        3 => Some("Тревога проникновения"),
        4 => Some("Помеха"),
        6 => Some("Помеха устранена"),
        7 => Some("Ручное включение"),
        8 => Some("Ручное выключение"),
        9 => Some("Активация УДП"),
        10 => Some("Восстановление УДП"),
        14 => Some("Подбор кода"),
        15 => Some("Дверь открыта"),
        17 => Some("Неудачное взятие"),
        18 => Some("Предъявлен код принуждения"),
        19 => Some("Тест (код 19)"),
        20 => Some("Вход в режим тестирования"),
        21 => Some("Выход из режима тестирования"),
        22 => Some("Восстановление контроля"),
        23 => Some("Задержка взятия"),
        24 => Some("Взят под охрану"),
        25 => Some("Доступ закрыт"),
        26 => Some("Доступ отклонен"),
        27 => Some("Дверь взломана"),
        28 => Some("Доступ предоставлен"),
        29 => Some("Запрет доступа"),
        30 => Some("Восстановление доступа"),
        31 => Some("Дверь закрыта"),
        32 => Some("Проход"),
        33 => Some("Дверь заблокирована"),
        34 => Some("Идентификация"),
        35 => Some("Восстановление технологического входа"),
        36 => Some("Нарушение технологического входа"),
        37 => Some("Пожар"),
        38 => Some("Нарушение 2-го технологического входа"),
        39 => Some("Восстановление нормы оборудования"),
        40 => Some("Пожар 2"),
        41 => Some("Неисправность оборудования"),
        42 => Some("Неизвестное устройство"),
        44 => Some("Внимание!"),
        45 => Some("Обрыв входа"),
        46 => Some("Обрыв ДПЛС"),
        47 => Some("Восстановление ДПЛС"),
        58 => Some("Тихая тревога"),
        71 => Some("Понижение уровня"),
        72 => Some("Норма уровня"),
        74 => Some("Повышение уровня"),
        75 => Some("Аварийное повышение уровня"),
        76 => Some("Повышение температуры"),
        77 => Some("Аварийное понижение уровня"),
        78 => Some("Температура в норме"),
        79 => Some("Тревога затопления"),
        80 => Some("Восстановление датчика затопления"),
        82 => Some("Неисправность термометра"),
        83 => Some("Восстановление термометра"),
        84 => Some("Начало локального программирования"),
        109 => Some("Снят с охраны"),
        111 => Some("Включение ШС"),
        112 => Some("Отключение ШС"),
        113 => Some("Включение выхода"),
        114 => Some("Отключение выхода"),
        117 => Some("Восстановление снятого входа"),
        118 => Some("Тревога входа"),
        119 => Some("Нарушение снятого входа"),
        121 => Some("Обрыв выхода"),
        122 => Some("КЗ выхода"),
        123 => Some("Восстановление выхода"),
        126 => Some("Потеря связи с выходом"),
        127 => Some("Восстановление связи с выходом"),
        128 => Some("Изменение состояния выхода"),
        130 => Some("Включение насоса"),
        131 => Some("Выключение насоса"),
        135 => Some("Ошибка при автоматическом тестировании"),
        137 => Some("Пуск"),
        138 => Some("Неудачный пуск"),
        139 => Some("Неудачный пуск пожаротушения"),
        140 => Some("Тест (код 140)"),
        141 => Some("Задержка пуска АУП"),
        142 => Some("Автоматика АУП выключена"),
        143 => Some("Отмена пуска АУП"),
        144 => Some("Тушение"),
        145 => Some("Аварийный пуск АУП"),
        146 => Some("Пуск АУП"),
        147 => Some("Блокировка пуска АУП"),
        148 => Some("Автоматика АУП включена"),
        149 => Some("Взлом корпуса прибора"),
        150 => Some("Пуск речевого оповещения"),
        151 => Some("Отмена пуска речевого оповещения"),
        152 => Some("Восстановление корпуса прибора"),
        153 => Some("ИУ в рабочем состоянии"),
        154 => Some("ИУ в исходном состоянии"),
        155 => Some("Отказ ИУ"),
        156 => Some("Ошибка ИУ"),
        158 => Some("Восстановление внутренней зоны"),
        159 => Some("Задержка пуска речевого оповещения"),
        161 => Some("Останов задержки пуска АУП"),
        165 => Some("Ошибка параметров входа"),
        187 => Some("Неизвестное состояние адресного устройства"),
        188 => Some("Восстановление связи со входом"),
        189 => Some("Потеря связи по ДПЛС1"),
        190 => Some("Потеря связи по ДПЛС2"),
        191 => Some("Восстановление связи по ДПЛС1"),
        192 => Some("Отключение выходного напряжения"),
        193 => Some("Подключение выходного напряжения"),
        194 => Some("Перегрузка источника питания"),
        195 => Some("Перегрузка источника питания устранена"),
        196 => Some("Неисправность зарядного устройства"),
        197 => Some("Восстановление зарядного устройства"),
        198 => Some("Неисправность источника питания"),
        199 => Some("Восстановление источника питания"),
        200 => Some("Восстановление батареи"),
        201 => Some("Восстановление связи по ДПЛС2"),
        202 => Some("Неисправность батареи"),
        203 => Some("Перезапуск прибора"),
        204 => Some("Требуется обслуживание"),
        205 => Some("Ошибка теста АКБ"),
        206 => Some("Понижение температуры"),
        211 => Some("Батарея разряжена"),
        212 => Some("Разряд резервной батареи"),
        213 => Some("Восстановление резервной батареи"),
        214 => Some("КЗ входа"),
        215 => Some("Короткое замыкание ДПЛС"),
        216 => Some("Сработка датчика"),
        217 => Some("Отключение ветви RS-485"),
        218 => Some("Восстановление ветви RS-485"),
        220 => Some("Срабатывание СДУ"),
        221 => Some("Отказ СДУ"),
        222 => Some("Повышение напряжения ДПЛС"),
        223 => Some("Отметка наряда"),
        237 => Some("Раздел снят по принуждению"),
        241 => Some("Раздел взят"),
        242 => Some("Раздел снят"),
        250 => Some("Потеряна связь с прибором"),
        251 => Some("Восстановлена связь с прибором"),
        253 => Some("Включение пульта С2000М"),
        _ => None,
    }
}

/// Description for a branch state code, with a placeholder for unknown codes.
pub fn branch_state_display(code: u8) -> String {
    match branch_state_description(code) {
        Some(s) => s.to_string(),
        None => format!("Unknown state {code}"),
    }
}
