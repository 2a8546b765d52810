// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

use anyhow::Context;

// Idioma usado quando o pedido não traz Accept-Language ou a chave falta no catálogo
pub const DEFAULT_LANG: &str = "en";

// Catálogos embutidos no binário (locales/*.json na raiz do crate)
const CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
    ("hi", include_str!("../../locales/hi.json")),
];

#[derive(Clone, Debug)]
pub struct I18nStore {
    catalogs: Arc<HashMap<String, HashMap<String, String>>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();

        for (lang, raw) in CATALOGS {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("catálogo de mensagens '{}' inválido", lang))?;
            catalogs.insert(lang.to_string(), messages);
        }

        tracing::debug!("🌐 {} catálogos de idioma carregados", catalogs.len());

        Ok(Self {
            catalogs: Arc::new(catalogs),
        })
    }

    /// Traduz `key` para `lang`, caindo para o inglês e, por fim, para a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.translate_with(lang, key, &[])
    }

    /// Igual a `translate`, substituindo marcadores `{nome}` pelos valores dados.
    pub fn translate_with(&self, lang: &str, key: &str, params: &[(&str, &str)]) -> String {
        let template = self
            .lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .unwrap_or(key);

        params.iter().fold(template.to_string(), |message, (name, value)| {
            message.replace(&format!("{{{}}}", name), value)
        })
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.catalogs
            .get(lang)
            .and_then(|messages| messages.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_parses() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.catalogs.len(), CATALOGS.len());
    }

    #[test]
    fn translates_to_requested_language() {
        let store = I18nStore::load().unwrap();
        assert_eq!(
            store.translate("pt", "errors.user_not_found"),
            "Usuário não encontrado."
        );
    }

    #[test]
    fn missing_key_falls_back_to_english_then_key() {
        let store = I18nStore::load().unwrap();
        // hi.json não traduz esta chave
        assert_eq!(
            store.translate("hi", "errors.category_in_use"),
            store.translate("en", "errors.category_in_use")
        );
        assert_eq!(store.translate("fr", "errors.nope"), "errors.nope");
    }

    #[test]
    fn substitutes_parameters() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate_with("en", "errors.insufficient_stock", &[("product", "Urea")]);
        assert_eq!(msg, "Not enough stock for 'Urea'.");
    }

    #[test]
    fn every_english_key_exists_in_portuguese() {
        let store = I18nStore::load().unwrap();
        let en = &store.catalogs["en"];
        let pt = &store.catalogs["pt"];
        for key in en.keys() {
            assert!(pt.contains_key(key), "chave '{}' ausente em pt.json", key);
        }
    }
}
