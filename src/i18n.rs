/// Translates user-visible strings. The actual machinery lives outside this
/// library; license titles are run through an implementation of this trait
/// when a register is built.
pub trait Translate {
    fn translate(&self, text: &str) -> String;
}

/// Passes strings through untranslated.
pub struct NoTranslation;

impl Translate for NoTranslation {
    fn translate(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Adapts a plain function or closure into a [`Translate`] implementation.
pub struct TranslateFn<F>(pub F);

impl<F> Translate for TranslateFn<F>
where
    F: Fn(&str) -> String,
{
    fn translate(&self, text: &str) -> String {
        (self.0)(text)
    }
}
