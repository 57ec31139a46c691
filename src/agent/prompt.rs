//! Opening instruction sent with the requisites file

/// Job used verbatim when the user says the work was a course
pub const COURSE_JOB_TASK: &str = "Обучение одного сотрудника на курсе «Хардкорная веб-разработка»";
pub const COURSE_JOB_PRICE: i64 = 170_000;

pub fn system_prompt() -> String {
    format!(
        "Твоя задача спросить у пользователя, что он хочет сгенерировать — акт или счёт или оба документа. \
         Затем нужно сгенерировать акт или счёт, для этого тебе надо взять реквизиты \
         контрагента из приложенного файла, а также запроси работы для включения в \
         акт (наименования задач и их стоимость), работ может быть несколько. \
         Если пользователь указывает в качестве работы курс, то для документов берём одну работу, в точности такую \
         \"{}\", стоимостью {} тыс руб. \
         Никакие данные не придумывай, всё необходимое строго запроси у \
         пользователя. Мои реквизиты заказчика не запрашивай, они есть в моём коде. \
         Имя и отчество подписанта сокращаем до одной первой буквы, \
         например, Иванов А.Е. \
         Название компании оборачиваем в кавычки ёлочкой, например, \
         ООО «Рога и копыта», то есть до названия компании ставим « и после названия \
         ставим ».",
        COURSE_JOB_TASK,
        COURSE_JOB_PRICE / 1000
    )
}
