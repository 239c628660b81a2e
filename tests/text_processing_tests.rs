#[cfg(test)]
mod tests {
    use cardapio_kb::classifier::{classify_line, item_lines, meals_in_text, weekdays_in_text, LineClass};
    use cardapio_kb::config::ExtractorConfig;
    use cardapio_kb::dedup::deduplicate;
    use cardapio_kb::extractor::ItemExtractor;
    use cardapio_kb::model::{ItemSource, MealType};

    fn create_extractor() -> ItemExtractor {
        ItemExtractor::new()
    }

    fn source() -> ItemSource {
        ItemSource::file("Colite.docx")
    }

    #[test]
    fn test_inline_quantity_lines() {
        let extractor = create_extractor();

        let cases = [
            ("Arroz integral 100g", "Arroz integral", "100g"),
            ("- Feijão carioca 80 g", "Feijão carioca", "80 g"),
            ("• Azeite de oliva 1 colher de sopa", "Azeite de oliva", "1 colher de sopa"),
            ("3. Mamão papaia 2 fatias", "Mamão papaia", "2 fatias"),
            ("Suco de laranja 200ml", "Suco de laranja", "200ml"),
            ("Aveia em flocos 2 colheres", "Aveia em flocos", "2 colheres"),
            ("Leite vegetal 1 xícara", "Leite vegetal", "1 xícara"),
        ];

        for (line, name, quantity) in cases {
            let item = extractor
                .extract_item(line, MealType::Lunch, "colite", &source())
                .unwrap_or_else(|| panic!("no item for '{line}'"));
            assert_eq!(item.name, name, "name for '{line}'");
            assert_eq!(item.quantity, quantity, "quantity for '{line}'");
        }
    }

    #[test]
    fn test_lines_without_quantity_emit_nothing() {
        let extractor = create_extractor();

        for line in ["Sal a gosto", "Modo de preparo", "Evite frituras e embutidos"] {
            assert!(extractor
                .extract_item(line, MealType::Lunch, "colite", &source())
                .is_none());
        }
    }

    #[test]
    fn test_trailing_and_spaced_quantities() {
        let extractor = create_extractor();

        let item = extractor
            .extract_item("Frango grelhado - 150g", MealType::Dinner, "geral", &source())
            .unwrap();
        assert_eq!((item.name.as_str(), item.quantity.as_str()), ("Frango grelhado", "150g"));

        let item = extractor
            .extract_item("Sopa de legumes 300 ml", MealType::Dinner, "geral", &source())
            .unwrap();
        assert_eq!((item.name.as_str(), item.quantity.as_str()), ("Sopa de legumes", "300 ml"));
    }

    #[test]
    fn test_short_header_switches_cursor_until_next_header() {
        let text = "Café da manhã\n\
                    Pão sem glúten 50g\n\
                    ALMOÇO\n\
                    Arroz 100g\n\
                    Legumes cozidos 120g\n\
                    Lanche da tarde\n\
                    Banana 1 unidade";

        let items = create_extractor().extract_document(text, "colite", &source());
        let meals: Vec<MealType> = items.iter().map(|i| i.meal_type).collect();

        assert_eq!(
            meals,
            vec![
                MealType::Breakfast,
                MealType::Lunch,
                MealType::Lunch,
                MealType::AfternoonSnack
            ]
        );
    }

    #[test]
    fn test_long_line_with_trigger_is_not_a_header() {
        let config = ExtractorConfig::default();
        let line = "No almoço prefira arroz integral, legumes cozidos no vapor e uma porção de proteína magra 120g";

        let (class, next) = classify_line(line, MealType::Dinner, &config);
        assert!(matches!(class, LineClass::Item(_)));
        assert_eq!(next, MealType::Dinner);
    }

    #[test]
    fn test_item_lines_skip_noise() {
        let config = ExtractorConfig::default();
        let (lines, last) = item_lines("Jantar\n\nok\n   \nSopa 300 ml", MealType::Lunch, &config);

        assert_eq!(lines, vec![("Sopa 300 ml", MealType::Dinner)]);
        assert_eq!(last, MealType::Dinner);
    }

    #[test]
    fn test_page_summaries() {
        let text = "Segunda-feira e quarta\nCafé da manhã\nAlmoço\nJantar";

        assert_eq!(meals_in_text(text), vec!["café da manhã", "almoço", "jantar"]);
        assert_eq!(weekdays_in_text(text), vec!["segunda", "quarta"]);
    }

    #[test]
    fn test_duplicates_across_documents_keep_first() {
        let extractor = create_extractor();
        let mut items = extractor.extract_document("Arroz 100g\nFeijão 80g", "geral", &ItemSource::file("a.docx"));
        items.extend(extractor.extract_document("ARROZ 100g", "geral", &ItemSource::file("b.docx")));

        let unique = deduplicate(items);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].source.file, "a.docx");
    }
}
