//! Prompt text sent to the model.

use std::path::Path;
use tuigpt_core::probe::{KnownTool, ToolInfo};

/// First user turn; the model acknowledges the rules before the REPL starts
pub const HANDSHAKE_PROMPT: &str = "Напиши Ок, если ты понял правила";

const NOT_INSTALLED: &str = "Не установлен";

/// Operating system and architecture of the running binary
pub fn os_description() -> String {
    format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH)
}

/// System prompt: directive grammar plus a description of the machine.
pub fn system_prompt(os: &str, cwd: &Path, listing: &str, tools: &[(KnownTool, ToolInfo)]) -> String {
    let mut available = String::new();
    for (tool, info) in tools {
        let version = match (info.installed, info.version.as_deref()) {
            (true, Some(version)) => version,
            (true, None) => "установлен",
            (false, _) => NOT_INSTALLED,
        };
        available.push_str(&format!("\n- {}: {}", tool.display_name, version));
    }

    format!(
        r#"Ты - ассистент пользователя с доступом к файловой системе и терминалу.

Режимы работы:

1. ОБЫЧНЫЙ РЕЖИМ. Если пользователь просто общается или задаёт вопрос, отвечай обычным текстом без специальных форматов.

2. АНАЛИТИЧЕСКИЙ РЕЖИМ. Если нужно проанализировать файл, напиши строку:
analyze путь_к_файлу
Система покажет содержимое файла с номерами строк и передаст его на анализ вместе с запросом пользователя. После этой строки можно писать обычный текст с выводами.

3. КОМАНДНЫЙ РЕЖИМ. Для работы с файлами и директориями используй только специальные форматы, каждый с начала строки:

cmd команда_терминала
(`cmd cd путь` меняет текущую директорию)

file имя_файла
^^^
содержимое файла
^^^
(строки между ^^^ дописываются в конец файла, недостающие директории создаются)

readfile путь_к_файлу
(система покажет содержимое файла)

ЗАПРЕЩЕНО:
- оборачивать код в ``` или другую markdown-разметку;
- использовать плейсхолдеры вроде [имя_репо], только реальные команды;
- смешивать объяснения и команды в командном режиме (кроме анализа).

Пример ответа на «Проанализируй calculator.py»:
analyze calculator.py
На строке 5 пропущено двоеточие после условия if. Исправленная версия:
file calculator_fixed.py
^^^
исправленный код
^^^

---

ИНФОРМАЦИЯ О СИСТЕМЕ:
- ОС: {os}
- Текущая директория: {cwd}

{listing}

ДОСТУПНЫЕ ИНСТРУМЕНТЫ:
- Командная строка (cmd)
- Создание и дополнение файлов (file)
- Чтение файлов (readfile)
- Анализ файлов (analyze){available}

---
Отвечай только на русском языке."#,
        os = os,
        cwd = cwd.display(),
        listing = listing,
        available = available,
    )
}

/// User turn wrapping the raw query with a fresh directory listing
pub fn enhanced_query(listing: &str, query: &str) -> String {
    format!(
        "Содержимое текущей директории:\n{}\n\nЗапрос пользователя: {}",
        listing, query
    )
}
